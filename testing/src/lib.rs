//! # Coral Testing
//!
//! Testing utilities and helpers for the Coral Island booking site.
//!
//! This crate provides:
//! - Deterministic clocks for environment injection
//! - A Given-When-Then builder for reducer tests
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use coral_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(WizardReducer)
//!     .with_env(test_environment(test_clock()))
//!     .given_state(WizardState::default())
//!     .when_action(WizardAction::Advance)
//!     .then_state(|state| assert!(state.warning.is_some()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use coral_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::{NaiveDate, TimeZone};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use coral_testing::mocks::FixedClock;
    /// use coral_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Clock pinned to 05:00 UTC (noon in Bangkok) on the given date
        ///
        /// Falls back to [`test_clock`] for an impossible date.
        #[must_use]
        pub fn on(date: NaiveDate) -> Self {
            date.and_hms_opt(5, 0, 0)
                .map(|naive| Self::new(Utc.from_utc_datetime(&naive)))
                .unwrap_or_else(test_clock)
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_clock_on_date_is_that_day_in_bangkok() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(FixedClock::on(date).today(), date);
    }
}
