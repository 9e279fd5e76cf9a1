//! # Reception Testing
//!
//! Testing utilities and helpers for the reception check-in desk.
//!
//! This crate provides:
//! - Mock implementations of the Environment traits
//!   ([`MockReceptionApi`], [`MemorySettingsStore`], [`MockCodeReader`], [`FixedClock`])
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Fixture builders for events and people
//!
//! ## Example
//!
//! ```ignore
//! use reception_testing::{MockReceptionApi, test_clock};
//! use reception_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_scan_renders_person() {
//!     let api = Arc::new(MockReceptionApi::new().with_person(Person::new("U123", "Aiko")));
//!     let store = Store::new(state, CheckinReducer::new(), environment(api.clone()));
//!
//!     store.send(CheckinAction::SubmitIdentifier { .. }).await?;
//!
//!     assert_eq!(api.count(Endpoint::ReadPerson), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use reception_core::environment::Clock;

pub mod api_mock;
pub mod device_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use reception_testing::mocks::FixedClock;
    /// use reception_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
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

/// Fixture builders
pub mod fixtures {
    use chrono::{DateTime, TimeDelta, Utc};
    use reception_core::model::{Configuration, Event, Person};

    /// Event starting `starts_in` after `now` and lasting `hours`.
    #[must_use]
    pub fn event(id: &str, name: &str, now: DateTime<Utc>, starts_in: TimeDelta, hours: i64) -> Event {
        let start_time = now + starts_in;
        Event {
            id: id.to_string(),
            name: name.to_string(),
            start_time,
            end_time: start_time + TimeDelta::hours(hours),
        }
    }

    /// Person with every tag filled in.
    #[must_use]
    pub fn student(id: &str, name: &str) -> Person {
        Person {
            id: id.to_string(),
            name: Some(name.to_string()),
            grade: Some("2".to_string()),
            affiliation: Some("Robotics Club".to_string()),
            student_id: Some(format!("S-{id}")),
        }
    }

    /// Complete configuration pointing at a test host.
    #[must_use]
    pub fn configuration() -> Configuration {
        Configuration::new("https://api.test", "test-key")
    }
}

// Re-export commonly used items
pub use api_mock::{ApiCall, Endpoint, MockReceptionApi};
pub use device_mocks::{MemorySettingsStore, MockCodeReader, ReaderCall};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
