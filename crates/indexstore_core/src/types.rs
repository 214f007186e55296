//! Plain value types shared by the wrappers.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A modification time reported by the store, relative to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Whole seconds.
    pub seconds: i64,
    /// Nanoseconds within the second.
    pub nanoseconds: i64,
}

impl Timestamp {
    /// Creates a timestamp.
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Returns true for the zero timestamp.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.seconds == 0 && self.nanoseconds == 0
    }

    /// Converts to a [`SystemTime`], or `None` if out of range.
    #[must_use]
    pub fn to_system_time(self) -> Option<SystemTime> {
        let nanos = Duration::from_nanos(u64::try_from(self.nanoseconds).ok()?);
        let base = if self.seconds >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(self.seconds.unsigned_abs()))?
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(self.seconds.unsigned_abs()))?
        };
        base.checked_add(nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_system_time() {
        let ts = Timestamp::new(1_700_000_000, 250);
        let expected = UNIX_EPOCH + Duration::new(1_700_000_000, 250);
        assert_eq!(ts.to_system_time(), Some(expected));
    }

    #[test]
    fn before_epoch() {
        let ts = Timestamp::new(-10, 0);
        assert_eq!(ts.to_system_time(), UNIX_EPOCH.checked_sub(Duration::from_secs(10)));
    }

    #[test]
    fn negative_nanoseconds_are_out_of_range() {
        assert_eq!(Timestamp::new(1, -1).to_system_time(), None);
    }

    #[test]
    fn display_and_zero() {
        assert_eq!(Timestamp::new(12, 5).to_string(), "12.000000005");
        assert!(Timestamp::default().is_zero());
    }
}
