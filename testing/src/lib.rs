//! # Event360 Testing
//!
//! Testing utilities and helpers for the Event360 architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A fluent Given-When-Then harness for reducers
//! - Assertion helpers for effects
//! - Store polling helpers for integration tests
//!
//! ## Example
//!
//! ```ignore
//! use event360_testing::{ReducerTest, test_clock};
//!
//! #[test]
//! fn quantity_falls_back_to_one() {
//!     ReducerTest::new(RegistrationReducer)
//!         .with_env(test_environment())
//!         .given_state(RegistrationState::default())
//!         .when_action(RegistrationAction::QuantityChanged { raw: "0".into() })
//!         .then_state(|state| {
//!             assert_eq!(state.form.quantity, 1);
//!         })
//!         .run();
//! }
//! ```

use chrono::{DateTime, Utc};
use event360_core::environment::Clock;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use event360_testing::mocks::FixedClock;
    /// use event360_core::environment::Clock;
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

/// Polling helpers for store-driven integration tests.
pub mod helpers {
    use event360_core::reducer::Reducer;
    use event360_runtime::Store;
    use std::time::Duration;

    /// Poll store state until a predicate holds or the timeout expires.
    ///
    /// Returns `true` if the predicate matched within the timeout. Useful for
    /// waiting on feedback actions from effect chains without racing them.
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.send(RegistrationAction::SubmitPressed).await?;
    /// assert!(wait_for_state(&store, |s| s.phase.is_terminal(), Duration::from_secs(1)).await);
    /// ```
    pub async fn wait_for_state<S, A, E, R, F>(
        store: &Store<S, A, E, R>,
        predicate: F,
        timeout: Duration,
    ) -> bool
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        S: Send + Sync + 'static,
        A: Send + Clone + 'static,
        E: Send + Sync + 'static,
        F: Fn(&S) -> bool,
    {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            if store.state(&predicate).await {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

// Re-export commonly used items
pub use helpers::wait_for_state;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
