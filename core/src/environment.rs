//! Dependency injection traits shared by every environment.
//!
//! All external dependencies are abstracted behind traits and injected via
//! the Environment parameter of a reducer. This module holds the traits that
//! are not domain-specific; domain service traits (the remote gateway, the
//! ticket scanner) live with their features.

use chrono::{DateTime, Utc};

/// Abstracts time operations for testability.
///
/// Date validation (a composed event must start no earlier than tomorrow)
/// depends on "now", so reducers read time through this trait and tests pin
/// it with a fixed implementation.
///
/// # Examples
///
/// ```
/// use event360_core::environment::{Clock, SystemClock};
///
/// fn tomorrow(clock: &dyn Clock) -> chrono::DateTime<chrono::Utc> {
///     clock.now() + chrono::Duration::days(1)
/// }
///
/// let later = tomorrow(&SystemClock);
/// assert!(later > SystemClock.now());
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
