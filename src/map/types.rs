//! Core ID types for the trajectory stores.

use std::time::Duration;

/// Frame timestamp in nanoseconds.
///
/// Timestamps are the keys of the trajectory: totally ordered and unique.
/// They serve as lightweight handles shared between the trajectory and the
/// loop candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 * 1e-9
    }

    /// Signed seconds elapsed since `origin` (negative if `self` is earlier).
    pub fn secs_since(&self, origin: Timestamp) -> f64 {
        if self.0 >= origin.0 {
            Duration::from_nanos(self.0 - origin.0).as_secs_f64()
        } else {
            -Duration::from_nanos(origin.0 - self.0).as_secs_f64()
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.0 / 1_000_000_000, self.0 % 1_000_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::from_nanos(10);
        let b = Timestamp::from_nanos(20);
        assert!(a < b);
        assert_eq!(a, Timestamp(10));
    }

    #[test]
    fn test_secs_since_is_signed() {
        let origin = Timestamp::from_nanos(1_500_000_000);
        let later = Timestamp::from_nanos(4_000_000_000);
        assert!((later.secs_since(origin) - 2.5).abs() < 1e-12);
        assert!((origin.secs_since(later) + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_display_seconds_and_nanos() {
        let t = Timestamp::from_nanos(1_403_636_579_763_555_584);
        assert_eq!(format!("{}", t), "1403636579.763555584");
    }
}
