//! Binary payloads with a MIME type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::store::error::StoreError;

/// Image bytes as stored in the blob store.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new("image/jpeg", bytes)
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode a base64 `data:` URL (`data:image/png;base64,...`).
    ///
    /// A missing MIME type defaults to `application/octet-stream`.
    pub fn from_data_url(url: &str) -> Result<Self, StoreError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StoreError::invalid_data_url("missing 'data:' prefix"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StoreError::invalid_data_url("missing ',' separator"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| StoreError::invalid_data_url("only base64 payloads are supported"))?;
        let mime = if mime.is_empty() {
            "application/octet-stream"
        } else {
            mime
        };

        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self::new(mime, bytes))
    }

    /// Encode as a base64 `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// The raw base64 payload, as sent to generation services.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
