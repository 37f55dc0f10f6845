//! Time source for credential issuance and validation.
//!
//! Everything that compares against "now" reads it through [`Clock`], so
//! tests can pin time with [`FixedClock`] instead of racing the wall clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;

/// A source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a settable instant.
///
/// Clones share the same instant, so a test can hold one handle and
/// advance time seen by a validator holding another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock frozen at `instant`.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(RwLock::new(instant)),
        }
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.write() = instant;
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write();
        *guard += by;
    }
}

impl Default for FixedClock {
    /// 2022-05-10T12:34:56Z
    fn default() -> Self {
        let instant = Utc
            .with_ymd_and_hms(2022, 5, 10, 12, 34, 56)
            .single()
            .unwrap_or_else(Utc::now);
        Self::at(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_defaults_to_reference_instant() {
        let clock = FixedClock::default();
        assert_eq!(clock.now().to_rfc3339(), "2022-05-10T12:34:56+00:00");
    }

    #[test]
    fn fixed_clock_clones_share_time() {
        // GIVEN: two handles to the same fixed clock
        let clock = FixedClock::default();
        let other = clock.clone();
        let start = clock.now();

        // WHEN: one handle advances
        clock.advance(Duration::minutes(31));

        // THEN: the other sees the new instant
        assert_eq!(other.now() - start, Duration::minutes(31));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
