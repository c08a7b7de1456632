//! GPS boundary.
//!
//! The real GPS task runs independently and publishes a rolling buffer of
//! recent fixes; the RF task only ever reads a snapshot, indexed by how many
//! seconds ago it was valid.
//! `GpsSource` is the seam; [`MockGpsSource`] is an in-memory test double.

use async_trait::async_trait;

/// A single GPS fix, mirroring the original firmware's `isComplete`/`isValid`
/// seqlock-like contract: `complete` means the fix finished updating without
/// being torn by a concurrent writer, `valid` means the receiver itself has
/// a lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: i32,
    pub longitude: i32,
    pub altitude_dam: u16,
    pub complete: bool,
    pub valid: bool,
}

impl Position {
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_valid(&self) -> bool {
        self.complete && self.valid
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude as f64 / crate::packet::LAT_COUNTS_PER_DEGREE
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude as f64 / crate::packet::LON_COUNTS_PER_DEGREE
    }

    pub fn reference_cosine(&self) -> f64 {
        self.latitude_deg().to_radians().cos()
    }
}

/// Boundary to the external GPS task.
#[async_trait]
pub trait GpsSource: Send + Sync {
    /// The fix from `offset_seconds` ago (0 = most recent), or `None` if no
    /// fix that old has been recorded yet.
    async fn position(&self, offset_seconds: u8) -> Option<Position>;

    /// Seconds elapsed since the last fix with `valid == true`. Feeds the
    /// 30-second GPS-lock-stale check.
    async fn seconds_since_lock(&self) -> u32;
}

/// In-memory GPS double for tests: a fixed ring of fixes indexed by age.
#[derive(Debug, Default)]
pub struct MockGpsSource {
    history: tokio::sync::Mutex<Vec<Position>>,
    seconds_since_lock: std::sync::atomic::AtomicU32,
}

impl MockGpsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fix as the newest entry (index 0 after the push).
    pub async fn push(&self, position: Position) {
        let mut history = self.history.lock().await;
        history.insert(0, position);
    }

    pub fn set_seconds_since_lock(&self, secs: u32) {
        self.seconds_since_lock
            .store(secs, std::sync::atomic::Ordering::Relaxed);
    }
}

#[async_trait]
impl GpsSource for MockGpsSource {
    async fn position(&self, offset_seconds: u8) -> Option<Position> {
        let history = self.history.lock().await;
        history.get(offset_seconds as usize).copied()
    }

    async fn seconds_since_lock(&self) -> u32 {
        self.seconds_since_lock
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: i32, lon: i32) -> Position {
        Position {
            latitude: lat,
            longitude: lon,
            altitude_dam: 100,
            complete: true,
            valid: true,
        }
    }

    #[tokio::test]
    async fn mock_returns_fixes_by_age_offset() {
        let gps = MockGpsSource::new();
        gps.push(fix(1, 1)).await;
        gps.push(fix(2, 2)).await;
        assert_eq!(gps.position(0).await, Some(fix(2, 2)));
        assert_eq!(gps.position(1).await, Some(fix(1, 1)));
        assert_eq!(gps.position(5).await, None);
    }

    #[test]
    fn is_valid_requires_both_complete_and_valid() {
        let mut p = fix(0, 0);
        assert!(p.is_valid());
        p.valid = false;
        assert!(!p.is_valid());
    }
}
