//! Cycle observer trait for progress reporting and data collection.

use chrono::NaiveDateTime;

use gf_core::Step;

use crate::{BreakdownReport, Cycle, TickReport};

/// Callbacks invoked by [`Cycle::tick`] at key points.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — hand-off logger
///
/// ```rust,ignore
/// struct HandoffLog(Vec<u64>);
///
/// impl CycleObserver for HandoffLog {
///     fn on_handoff(&mut self, generation: u64, _start: NaiveDateTime) {
///         self.0.push(generation);
///     }
/// }
/// ```
pub trait CycleObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _step: Step, _now: NaiveDateTime) {}

    /// Called once every truck has advanced.  `cycle` already reflects the
    /// step; a hand-off at the end of the cycle happens after this call.
    fn on_tick_end(&mut self, _cycle: &Cycle, _report: &TickReport) {}

    /// Secondary warehouses were refilled at simulated midnight.
    fn on_replenish(&mut self, _at: NaiveDateTime, _refilled: usize) {}

    /// A truck broke down during the tick.
    fn on_breakdown(&mut self, _report: &BreakdownReport) {}

    /// A new solution was adopted.
    fn on_handoff(&mut self, _generation: u64, _interval_start: NaiveDateTime) {}
}

/// A [`CycleObserver`] that does nothing.
pub struct NoopObserver;

impl CycleObserver for NoopObserver {}
