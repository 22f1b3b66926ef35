//! Cancellable scheduled tasks owned by the viewer runtime.
//!
//! Both timers are inert values polled from the runtime's `select!` loop:
//! a stopped timer's future never resolves, so stopping one is just a state
//! change with no background task left behind.

use std::future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};

/// A fixed-period timer with an explicit start/stop contract.
#[derive(Debug)]
pub struct RecurringTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl RecurringTimer {
    /// Creates a stopped timer.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Returns the timer period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts, or restarts, the timer. The first tick fires one full period
    /// from now.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        // Late ticks are delayed rather than bursted; progress stays one
        // fixed step per tick.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Stops the timer. Pending ticks are discarded.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Returns `true` while the timer is started.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Resolves on the next tick; pends forever while stopped. Cancel-safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}

/// A single deadline that can be armed, re-armed or cancelled.
#[derive(Debug, Default)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    /// Creates a disarmed timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire `after` from now, replacing any pending
    /// deadline.
    pub fn schedule(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    /// Disarms the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` while a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the deadline passes, then disarms; pends forever while
    /// disarmed. Cancel-safe.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{Instant, timeout};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_recurring_timer_first_tick_waits_one_period() {
        let mut timer = RecurringTimer::new(Duration::from_millis(100));
        let started = Instant::now();
        timer.start();

        timer.tick().await;

        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_recurring_timer_never_ticks() {
        let mut timer = RecurringTimer::new(Duration::from_millis(100));
        timer.start();
        timer.stop();

        let result = timeout(Duration::from_secs(5), timer.tick()).await;

        assert!(result.is_err());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_pushes_next_tick_out() {
        let mut timer = RecurringTimer::new(Duration::from_millis(100));
        timer.start();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let restarted = Instant::now();

        timer.start();
        timer.tick().await;

        assert_eq!(restarted.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once_then_disarms() {
        let mut timer = OneShotTimer::new();
        timer.schedule(Duration::from_secs(1));
        assert!(timer.is_armed());

        timer.fired().await;

        assert!(!timer.is_armed());
        assert!(timeout(Duration::from_secs(5), timer.fired()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_deadline() {
        let mut timer = OneShotTimer::new();
        let start = Instant::now();
        timer.schedule(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(600)).await;

        timer.schedule(Duration::from_secs(1));
        timer.fired().await;

        assert_eq!(start.elapsed(), Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_one_shot_never_fires() {
        let mut timer = OneShotTimer::new();
        timer.schedule(Duration::from_millis(10));
        timer.cancel();

        assert!(timeout(Duration::from_secs(5), timer.fired()).await.is_err());
    }
}
