//! Transient URLs for stored blobs.
//!
//! Views display stored images through short-lived URLs rather than by
//! copying bytes around. An [`ObjectUrl`] keeps its blob registered until
//! it is revoked or dropped, so replacing a handle (or letting a view go
//! out of scope) releases the previous URL.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::store::blob::Blob;

#[derive(Debug, Default)]
struct Registry {
    next: u64,
    blobs: HashMap<String, Blob>,
}

/// Owner of all live object URLs. Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` and return a handle to its URL.
    pub fn create(&self, blob: Blob) -> ObjectUrl {
        let mut registry = self.inner.borrow_mut();
        registry.next += 1;
        let url = format!("blob:vdat/{}", registry.next);
        registry.blobs.insert(url.clone(), blob);
        log::trace!("Created object URL {}", url);

        ObjectUrl {
            url,
            registry: Rc::downgrade(&self.inner),
            revoked: false,
        }
    }

    /// Look up the blob behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.inner.borrow().blobs.get(url).cloned()
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.inner.borrow().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().blobs.is_empty()
    }
}

/// Handle to a registered URL. Revoked on drop.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: Weak<RefCell<Registry>>,
    revoked: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// The blob behind this URL, while it is live.
    pub fn blob(&self) -> Option<Blob> {
        if self.revoked {
            return None;
        }
        let registry = self.registry.upgrade()?;
        registry.borrow().blobs.get(&self.url).cloned()
    }

    /// Release the URL. Safe to call more than once.
    pub fn revoke(&mut self) {
        if self.revoked {
            return;
        }
        self.revoked = true;
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().blobs.remove(&self.url);
            log::trace!("Revoked object URL {}", self.url);
        }
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.revoke();
    }
}
