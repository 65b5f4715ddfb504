//! Simulated time model.
//!
//! # Design
//!
//! A routing solution covers one **cycle**: a fixed span of simulated time
//! (default 2 h) divided into a fixed number of discrete steps (default 140).
//! The calendar time of a step inside the cycle is
//!
//!   time(step) = cycle_start + span * step / steps_per_cycle
//!
//! computed in integer milliseconds from the cycle start, so there is no
//! accumulated drift however many steps are taken.  Wall-clock pacing is a
//! separate concern handled by the playback clock in `gf-sim`.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

// ── Step ──────────────────────────────────────────────────────────────────────

/// A step counter (one route node per step).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    #[inline]
    pub fn next(self) -> Step {
        Step(self.0 + 1)
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── CycleClock ────────────────────────────────────────────────────────────────

/// Maps steps within the active cycle to simulated calendar time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleClock {
    /// Simulated calendar time of step 0 (the solution's interval start).
    pub cycle_start:     NaiveDateTime,
    /// Simulated time covered by one full cycle.
    pub span:            TimeDelta,
    /// Number of discrete steps per cycle.
    pub steps_per_cycle: u32,
    /// Steps taken so far in this cycle.
    pub step:            Step,
}

impl CycleClock {
    pub fn new(cycle_start: NaiveDateTime, span: TimeDelta, steps_per_cycle: u32) -> Self {
        Self {
            cycle_start,
            span,
            steps_per_cycle: steps_per_cycle.max(1),
            step: Step::ZERO,
        }
    }

    /// Advance by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.step = self.step.next();
    }

    /// Start a new cycle at `cycle_start`, resetting the step counter.
    pub fn restart_at(&mut self, cycle_start: NaiveDateTime) {
        self.cycle_start = cycle_start;
        self.step = Step::ZERO;
    }

    /// Simulated time elapsed from the cycle start to `step`.
    pub fn offset_of(&self, step: Step) -> TimeDelta {
        let span_ms = self.span.num_milliseconds();
        let ms = (span_ms as i128 * step.0 as i128) / self.steps_per_cycle as i128;
        TimeDelta::milliseconds(ms as i64)
    }

    /// Calendar time of `step` within this cycle.
    #[inline]
    pub fn time_at(&self, step: Step) -> NaiveDateTime {
        self.cycle_start + self.offset_of(step)
    }

    /// Calendar time of the current step.
    #[inline]
    pub fn now(&self) -> NaiveDateTime {
        self.time_at(self.step)
    }

    /// Nominal simulated duration of one step.
    pub fn step_duration(&self) -> TimeDelta {
        self.offset_of(Step(1))
    }

    /// Interval start of the cycle that follows this one.
    #[inline]
    pub fn next_cycle_start(&self) -> NaiveDateTime {
        self.cycle_start + self.span
    }
}

impl fmt::Display for CycleClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({})",
            self.step,
            self.steps_per_cycle,
            self.now().format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// `true` if moving from `before` to `after` passes through (or lands
/// exactly on) a simulated 00:00:00.
///
/// Starting exactly at midnight does not count: that crossing happened on
/// the previous step.
#[inline]
pub fn crosses_midnight(before: NaiveDateTime, after: NaiveDateTime) -> bool {
    after > before && after.date() > before.date()
}
