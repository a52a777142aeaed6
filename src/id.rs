//! Timestamp-derived identifiers.
//!
//! Shape ids, history keys, gallery keys and project ids are all wall-clock
//! milliseconds, so the key doubles as creation order. A plain `now()` would
//! collide when several records are created within the same millisecond
//! (batch generation), so the generator never hands out a value that is not
//! strictly greater than the last one.

use web_time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Monotonic, timestamp-derived id source.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after ids that were already handed out (e.g. loaded from storage).
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Next id based on the current wall clock.
    pub fn next_id(&mut self) -> u64 {
        self.next_block_at(1, now_millis())
    }

    /// Reserve `len` consecutive ids and return the first one.
    ///
    /// History records use `base`, `base + 1` and `base + 2` for their image,
    /// thumbnail and result thumbnail; reserving the block keeps those keys
    /// from being handed out again.
    pub fn next_block(&mut self, len: u64) -> u64 {
        self.next_block_at(len, now_millis())
    }

    /// Same as [`next_block`](Self::next_block) with an explicit clock reading.
    pub fn next_block_at(&mut self, len: u64, now: u64) -> u64 {
        let base = now.max(self.last + 1);
        self.last = base + len.max(1) - 1;
        base
    }

    /// Last id handed out.
    pub fn last(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let mut ids = IdGenerator::new();
        let a = ids.next_block_at(1, 1_000);
        let b = ids.next_block_at(1, 1_000);
        let c = ids.next_block_at(1, 999);
        assert_eq!(a, 1_000);
        assert_eq!(b, 1_001);
        assert_eq!(c, 1_002);
    }

    #[test]
    fn test_block_reserves_consecutive_keys() {
        let mut ids = IdGenerator::new();
        let base = ids.next_block_at(3, 5_000);
        assert_eq!(base, 5_000);
        assert_eq!(ids.last(), 5_002);
        assert_eq!(ids.next_block_at(1, 5_000), 5_003);
    }

    #[test]
    fn test_follows_wall_clock() {
        let mut ids = IdGenerator::starting_after(10);
        assert_eq!(ids.next_block_at(1, 20_000), 20_000);
        assert!(ids.next_id() > 20_000);
    }
}
