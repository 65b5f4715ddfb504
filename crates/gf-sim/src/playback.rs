//! Wall-clock pacing.
//!
//! One simulated route node takes `secs_per_node` of wall time.  In
//! [`PlaybackMode::Dynamic`] a base figure is scaled by
//! `reference_speed / fleet_average_speed`, so a faster fleet ticks more
//! often.  The resulting period never drops below the configured minimum.
//!
//! [`PlaybackClock`] turns the period into a stream of tick signals.  Ticks
//! go through a one-slot channel with a blocking send: a consumer that is
//! still busy delays the next tick instead of losing it.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use gf_core::EngineConfig;
use gf_fleet::Truck;
use gf_intake::TaskHandle;

/// Bounds on the operator-set seconds per node.
pub const FIXED_SECS_MIN: f64 = 0.1;
pub const FIXED_SECS_MAX: f64 = 100.0;

/// Upper bound on any timer period (one day).
const MAX_PERIOD: Duration = Duration::from_secs(86_400);

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum PlaybackMode {
    /// Operator-chosen seconds per node, bounded to
    /// [`FIXED_SECS_MIN`]..=[`FIXED_SECS_MAX`].
    Fixed { secs_per_node: f64 },
    /// `base_secs_per_node × reference_speed / fleet average speed`.
    Dynamic { base_secs_per_node: f64, reference_speed: f64 },
}

impl PlaybackMode {
    /// A fixed mode with `secs_per_node` clamped into range.  Non-finite input
    /// falls back to the upper bound.
    pub fn fixed(secs_per_node: f64) -> Self {
        let secs = if secs_per_node.is_finite() {
            secs_per_node.clamp(FIXED_SECS_MIN, FIXED_SECS_MAX)
        } else {
            FIXED_SECS_MAX
        };
        PlaybackMode::Fixed { secs_per_node: secs }
    }

    /// Dynamic mode with the base and reference speed taken from `config`.
    pub fn dynamic(config: &EngineConfig) -> Self {
        PlaybackMode::Dynamic {
            base_secs_per_node: config.secs_per_node,
            reference_speed:    config.reference_speed,
        }
    }
}

impl Default for PlaybackMode {
    fn default() -> Self {
        PlaybackMode::dynamic(&EngineConfig::default())
    }
}

/// Mean speed of trucks that are neither broken nor in maintenance.
/// `None` when no truck qualifies.
pub fn fleet_average_speed(trucks: &[Truck]) -> Option<f64> {
    let (sum, n) = trucks
        .iter()
        .filter(|t| t.status.is_active() && t.speed_kmh.is_finite() && t.speed_kmh > 0.0)
        .fold((0.0, 0usize), |(sum, n), t| (sum + t.speed_kmh, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Wall-clock seconds per node for `mode`.  With no active truck the
/// fleet is assumed to move at `config.default_speed`.
pub fn secs_per_node(mode: PlaybackMode, trucks: &[Truck], config: &EngineConfig) -> f64 {
    match mode {
        PlaybackMode::Fixed { secs_per_node } => {
            secs_per_node.clamp(FIXED_SECS_MIN, FIXED_SECS_MAX)
        }
        PlaybackMode::Dynamic { base_secs_per_node, reference_speed } => {
            let speed = fleet_average_speed(trucks).unwrap_or(config.default_speed);
            base_secs_per_node * (reference_speed / speed)
        }
    }
}

/// Timer period for `mode`, never below `config.min_period()` and never
/// above one day.
pub fn tick_period(mode: PlaybackMode, trucks: &[Truck], config: &EngineConfig) -> Duration {
    let secs = secs_per_node(mode, trucks, config);
    // NaN or negative input lands on the minimum.
    let period = Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
        if secs > 0.0 { MAX_PERIOD } else { Duration::ZERO }
    });
    period.min(MAX_PERIOD).max(config.min_period())
}

// ── PlaybackClock ─────────────────────────────────────────────────────────────

/// Owns exactly one repeating timer.
///
/// `start` while running and `stop` while stopped are no-ops.  The receiver
/// returned by [`PlaybackClock::new`] survives stop/start cycles.
pub struct PlaybackClock {
    period_tx: watch::Sender<Duration>,
    period_rx: watch::Receiver<Duration>,
    tick_tx:   mpsc::Sender<u64>,
    task:      TaskHandle,
    ticks:     u64,
}

impl PlaybackClock {
    pub fn new(period: Duration) -> (Self, mpsc::Receiver<u64>) {
        let (period_tx, period_rx) = watch::channel(period);
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let clock = Self {
            period_tx,
            period_rx,
            tick_tx,
            task: TaskHandle::idle("playback"),
            ticks: 0,
        };
        (clock, tick_rx)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    pub fn period(&self) -> Duration {
        *self.period_rx.borrow()
    }

    /// Change the period.  Takes effect from the next tick.  Returns `true`
    /// if the value changed.
    pub fn set_period(&self, period: Duration) -> bool {
        let changed = self.period_tx.send_if_modified(|p| {
            if *p == period {
                false
            } else {
                *p = period;
                true
            }
        });
        if changed {
            tracing::debug!(period_ms = period.as_millis() as u64, "playback period changed");
        }
        changed
    }

    /// Start the timer.  Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let mut period_rx = self.period_rx.clone();
        let tick_tx = self.tick_tx.clone();
        let first_seq = self.ticks;
        self.task = TaskHandle::spawn("playback", async move {
            let mut period = *period_rx.borrow_and_update();
            let mut interval = schedule(period);
            let mut seq = first_seq;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        seq += 1;
                        if tick_tx.send(seq).await.is_err() {
                            break;
                        }
                    }
                    changed = period_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        period = *period_rx.borrow_and_update();
                        interval = schedule(period);
                    }
                }
            }
        });
        tracing::info!(period_ms = self.period().as_millis() as u64, "playback started");
        true
    }

    /// Stop the timer.  Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        let stopped = self.task.cancel();
        if stopped {
            tracing::info!("playback stopped");
        }
        stopped
    }

    /// Record that a tick was consumed.  Keeps sequence numbers increasing
    /// across restarts.
    pub(crate) fn consumed(&mut self, seq: u64) {
        self.ticks = self.ticks.max(seq);
    }
}

fn schedule(period: Duration) -> time::Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
