//! Time source for story timestamps and expiry checks.

use chrono::{DateTime, Utc};

/// Supplies "now" to the store, so expiry can be driven by tests.
pub trait Clock: Send + Sync {
    /// Returns the current wall-clock instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used by the running server.
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
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;

        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
    }
}
