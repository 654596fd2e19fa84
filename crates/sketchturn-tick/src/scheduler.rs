//! Fixed-period tick scheduler.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Zero is bumped to one millisecond.
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

impl TickConfig {
    /// Smallest period the scheduler will run at.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(period = ?self.period, "tick period below minimum, clamping");
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

/// Information about a fired tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Whole periods that elapsed without their own tick.
    pub ticks_skipped: u64,
}

/// One-tick-per-period scheduler for a single room.
///
/// Starts paused: nothing fires until [`restart`](Self::restart) is
/// called.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: Instant,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(period = ?config.period, "tick scheduler created");
        Self {
            next_tick: Instant::now() + config.period,
            config,
            tick_count: 0,
            paused: true,
        }
    }

    /// A scheduler ticking once per second.
    pub fn every_second() -> Self {
        Self::new(TickConfig::default())
    }

    /// Waits until the next tick is due.
    ///
    /// While paused this future never resolves. It holds no state across
    /// the await point, so dropping it in a `select!` loses nothing.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_tick;
        time::sleep_until(due).await;

        let period = self.config.period;
        let now = Instant::now();
        let late_by = now.saturating_duration_since(due);
        // Late wake-ups fire once and report the missed periods; the next
        // tick is scheduled from now.
        let ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
        self.tick_count += 1;
        self.next_tick = now + period;

        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_millis() as u64,
                "tick overrun"
            );
        }
        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }

    /// Re-anchors the schedule so the next tick fires one full period from
    /// now, and resumes if paused.
    pub fn restart(&mut self) {
        self.paused = false;
        self.next_tick = Instant::now() + self.config.period;
        trace!(tick = self.tick_count, "tick scheduler restarted");
    }

    /// Stops ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.config.period
    }
}
