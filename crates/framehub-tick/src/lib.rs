//! Fixed-timestep frame clock for framehub games.
//!
//! A game ticks at a fixed rate (30 Hz by default) once every player has
//! loaded. Each tick advances the game's frame counter by one and flushes
//! pending frames to every player.
//!
//! The scheduler is created stopped: [`TickScheduler::wait_for_tick`] pends
//! until [`TickScheduler::start`] is called, and pends again after
//! [`TickScheduler::stop`]. That lets it sit in a game actor's
//! `tokio::select!` from the moment the game is spawned:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(msg) = inbox.recv() => game.handle(msg).await,
//!         _ = scheduler.wait_for_tick() => {
//!             game.tick();
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the clock wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, up to `max_catchup` of them, so the
    /// frame counter keeps pace with wall time after a short stall.
    CatchUp { max_catchup: u32 },
}

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. Must be at least 1.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0–1.0) above which a tick's work is
    /// logged as slow.
    pub budget_warn_threshold: f64,
    /// Upper bound in microseconds for the random delay added to the first
    /// tick after [`TickScheduler::start`]. Spreads games that start in the
    /// same instant across the tick interval.
    pub start_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::DEFAULT_TICK_RATE_HZ,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            start_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// The lockstep rate clients are built for.
    pub const DEFAULT_TICK_RATE_HZ: u32 = 30;
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// A config for the given rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values.
    ///
    /// The rate is forced into `1..=MAX_TICK_RATE_HZ` and the warn
    /// threshold into `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        let rate = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if rate != self.tick_rate_hz {
            warn!(requested = self.tick_rate_hz, rate, "tick rate out of range, clamping");
            self.tick_rate_hz = rate;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Tick info and metrics
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Ticks fired since the scheduler was created, starting at 1.
    pub tick: u64,
    /// `true` if the clock woke up more than 10% of a tick late.
    pub overrun: bool,
    /// Ticks dropped because of the overrun.
    pub ticks_skipped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Slowest tick reported via [`TickScheduler::record_tick_end`].
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep clock for one game.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    /// `None` while stopped.
    next_tick: Option<TokioInstant>,
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a stopped scheduler.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        debug!(
            rate_hz = config.tick_rate_hz,
            policy = ?config.policy,
            "tick scheduler created"
        );
        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick: None,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Starts the clock. The first tick fires one tick duration (plus
    /// jitter) from now. Does nothing if already running.
    pub fn start(&mut self) {
        if self.next_tick.is_some() {
            return;
        }
        let jitter = if self.config.start_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..self.config.start_jitter_us))
        } else {
            Duration::ZERO
        };
        self.next_tick = Some(TokioInstant::now() + self.tick_duration + jitter);
        debug!(tick = self.tick_count, "tick scheduler started");
    }

    /// Stops the clock. [`wait_for_tick`](Self::wait_for_tick) pends until
    /// the next [`start`](Self::start).
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(tick = self.tick_count, "tick scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Waits for the next tick. Pends forever while stopped.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        let dur = self.tick_duration;
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > dur / 10;
        let behind = if overrun {
            u64::try_from(late_by.as_nanos() / dur.as_nanos()).unwrap_or(u64::MAX)
        } else {
            0
        };

        let (next_tick, ticks_skipped) = match self.config.policy {
            TickPolicy::Skip => (now + dur, behind),
            TickPolicy::CatchUp { max_catchup } if behind <= u64::from(max_catchup) => {
                (next + dur, 0)
            }
            TickPolicy::CatchUp { max_catchup } => {
                (now + dur, behind - u64::from(max_catchup))
            }
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = Some(next_tick);

        self.metrics.total_ticks += 1;
        self.metrics.total_skipped += ticks_skipped;
        if overrun {
            self.metrics.total_overruns += 1;
        }
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work done for the current tick.
    ///
    /// Logs a warning if the work took more than the configured share of
    /// the tick budget. Without this call no budget checks happen.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                "tick work approaching budget"
            );
        }
        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
