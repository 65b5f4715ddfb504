//! The `Cycle` struct and its tick.

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};

use gf_core::{
    CycleClock, DiagnosticSink, EngineConfig, GridPoint, OrderCode, Step, TruckCode,
    crosses_midnight,
};
use gf_fleet::{
    Blockage, LoadModel, OrderBook, Route, Solution, Truck, TruckStatus, Warehouse,
    replenish_secondaries,
};
use gf_motion::{StepContext, StepOutcome, advance_truck, settle_deliveries};

use crate::CycleObserver;

// ── Reports ───────────────────────────────────────────────────────────────────

/// Why a truck became Broken.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BreakdownCause {
    /// Fuel reached 0.  Terminal for the cycle; the solver is not told.
    FuelExhausted,
    /// A breakdown tag on the route node the truck reached.
    Scripted,
    /// Requested by the operator through [`Cycle::force_breakdown`].
    Operator,
}

/// One truck breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakdownReport {
    pub truck:    TruckCode,
    pub cause:    BreakdownCause,
    /// 0 for fuel exhaustion.
    pub severity: u8,
    pub at:       NaiveDateTime,
    pub location: GridPoint,
}

impl BreakdownReport {
    /// Whether the solver should be asked to re-plan around this breakdown.
    #[inline]
    pub fn needs_replan(&self) -> bool {
        self.cause != BreakdownCause::FuelExhausted
    }
}

/// What one call to [`Cycle::tick`] did.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Step index within the cycle that was executed.
    pub step:            Step,
    /// Simulated time after the step.
    pub now:             NaiveDateTime,
    pub steps_remaining: u32,
    /// Set on the one tick per cycle that should request the next solution;
    /// carries that solution's interval start.
    pub prefetch_due:    Option<NaiveDateTime>,
    /// Secondary warehouses refilled this tick (midnight crossing).
    pub replenished:     usize,
    /// One outcome per truck, in truck order.
    pub outcomes:        Vec<StepOutcome>,
    pub breakdowns:      Vec<BreakdownReport>,
    /// Generation adopted during this tick, if a hand-off happened.
    pub handoff:         Option<u64>,
    /// The cycle is over and no next solution is available; the caller must
    /// supply one via [`Cycle::adopt`].  Until it does, further ticks
    /// advance nothing.
    pub exhausted:       bool,
}

/// Read-only summary of the cycle state.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleStatus {
    pub step:               Step,
    pub steps_per_cycle:    u32,
    pub steps_remaining:    u32,
    pub prefetch_requested: bool,
    pub next_ready:         bool,
    pub generation:         u64,
    pub cycles_completed:   u64,
    pub now:                NaiveDateTime,
    /// Simulated time advanced since the cycle controller was built.
    pub sim_elapsed:        TimeDelta,
}

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// Exclusive owner of the active cycle: trucks, routes, orders and
/// warehouses plus the countdown to the next hand-off.
///
/// `trucks[i]` follows `routes[i]`; both are sorted by truck code.
///
/// Create via [`CycleBuilder`][crate::CycleBuilder].
pub struct Cycle {
    pub config:     EngineConfig,
    pub clock:      CycleClock,
    pub trucks:     Vec<Truck>,
    pub routes:     Vec<Route>,
    pub orders:     OrderBook,
    pub warehouses: Vec<Warehouse>,
    pub blockages:  Vec<Blockage>,
    pub unassigned: Vec<OrderCode>,

    pub(crate) load:               LoadModel,
    pub(crate) sink:               Arc<dyn DiagnosticSink>,
    pub(crate) steps_remaining:    u32,
    pub(crate) prefetch_requested: bool,
    pub(crate) next:               Option<Solution>,
    pub(crate) generation:         u64,
    pub(crate) cycles_completed:   u64,
    pub(crate) sim_elapsed:        TimeDelta,
}

impl Cycle {
    // ── Public API ────────────────────────────────────────────────────────

    /// Advance every truck by one step.
    ///
    /// ```text
    /// ① prefetch check   steps_remaining - 1 == threshold, once per cycle
    /// ② replenishment    secondaries refilled if the step crosses midnight
    /// ③ advance          truck-local phase (parallel with `parallel`)
    /// ④ settle           deliveries credited in truck order
    /// ⑤ countdown        clock + steps_remaining
    /// ⑥ hand-off         adopt the prefetched solution when the cycle ends
    /// ```
    pub fn tick<O: CycleObserver>(&mut self, observer: &mut O) -> TickReport {
        let mut leading_handoff = None;
        if self.steps_remaining == 0 {
            leading_handoff = self.hand_off_pending(observer);
            if leading_handoff.is_none() {
                return TickReport {
                    step: self.clock.step,
                    now: self.clock.now(),
                    exhausted: true,
                    ..TickReport::default()
                };
            }
        }

        let step = self.clock.step;
        let before = self.clock.now();
        let after = self.clock.time_at(step.next());
        observer.on_tick_start(step, before);

        let mut report = TickReport { step, handoff: leading_handoff, ..TickReport::default() };

        // ① Prefetch.
        if !self.prefetch_requested
            && self.steps_remaining - 1 == self.config.prefetch_threshold()
        {
            self.prefetch_requested = true;
            let at = self.clock.next_cycle_start();
            report.prefetch_due = Some(at);
            tracing::info!(%step, generation = self.generation, next = %at, "prefetch due");
        }

        // ② Midnight replenishment, before trucks move.
        if crosses_midnight(before, after) {
            report.replenished = replenish_secondaries(&mut self.warehouses);
            tracing::info!(at = %after, refilled = report.replenished, "secondary warehouses replenished");
            observer.on_replenish(after, report.replenished);
        }

        // ③ + ④
        report.outcomes = self.advance_all();
        for (truck, outcome) in self.trucks.iter().zip(&report.outcomes) {
            if !outcome.broke_down() {
                continue;
            }
            let (cause, severity) = match outcome.breakdown {
                Some(severity) => (BreakdownCause::Scripted, severity),
                None => (BreakdownCause::FuelExhausted, 0),
            };
            let b = BreakdownReport {
                truck: truck.code.clone(),
                cause,
                severity,
                at: after,
                location: truck.location,
            };
            observer.on_breakdown(&b);
            report.breakdowns.push(b);
        }

        // ⑤ Countdown.
        self.clock.advance();
        self.steps_remaining -= 1;
        self.sim_elapsed += after - before;
        report.now = after;
        report.steps_remaining = self.steps_remaining;

        observer.on_tick_end(self, &report);

        // ⑥ Hand-off.
        if self.steps_remaining == 0 {
            match self.hand_off_pending(observer) {
                Some(generation) => report.handoff = Some(generation),
                None => {
                    report.exhausted = true;
                    tracing::warn!(
                        generation = self.generation,
                        "cycle exhausted with no prefetched solution"
                    );
                }
            }
        }

        report
    }

    /// Store a prefetched solution for adoption at the end of the cycle.
    /// Returns `false` (and drops it) if it has no routes.
    pub fn offer_next(&mut self, solution: Solution) -> bool {
        if !solution.is_structurally_valid() {
            return false;
        }
        tracing::debug!(generation = self.generation, start = %solution.interval_start, "next solution ready");
        self.next = Some(solution);
        true
    }

    /// If the cycle is over and a next solution was offered, adopt it now.
    /// Returns the new generation.
    pub fn hand_off_pending<O: CycleObserver>(&mut self, observer: &mut O) -> Option<u64> {
        if self.steps_remaining != 0 {
            return None;
        }
        let next = self.next.take()?;
        self.hand_off(next);
        observer.on_handoff(self.generation, self.clock.cycle_start);
        Some(self.generation)
    }

    /// Adopt `solution` immediately, discarding the active cycle and any
    /// stored next solution.  Returns the new generation, or `None` if the
    /// solution has no routes.
    pub fn adopt(&mut self, solution: Solution) -> Option<u64> {
        if !solution.is_structurally_valid() {
            return None;
        }
        self.generation += 1;
        self.install(solution);
        Some(self.generation)
    }

    /// Mark `truck` Broken on operator request.  `None` if the truck is
    /// unknown or already broken.
    pub fn force_breakdown(&mut self, truck: &TruckCode, severity: u8) -> Option<BreakdownReport> {
        let at = self.clock.now();
        let t = self.trucks.iter_mut().find(|t| &t.code == truck)?;
        if t.status == TruckStatus::Broken {
            return None;
        }
        t.status = TruckStatus::Broken;
        tracing::info!(truck = %t.code, severity, at = %at, "operator breakdown");
        Some(BreakdownReport {
            truck: t.code.clone(),
            cause: BreakdownCause::Operator,
            severity,
            at,
            location: t.location,
        })
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.steps_remaining
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.steps_remaining == 0 && self.next.is_none()
    }

    #[inline]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn status(&self) -> CycleStatus {
        CycleStatus {
            step:               self.clock.step,
            steps_per_cycle:    self.clock.steps_per_cycle,
            steps_remaining:    self.steps_remaining,
            prefetch_requested: self.prefetch_requested,
            next_ready:         self.next.is_some(),
            generation:         self.generation,
            cycles_completed:   self.cycles_completed,
            now:                self.clock.now(),
            sim_elapsed:        self.sim_elapsed,
        }
    }

    /// Truck and route by code.
    pub fn find(&self, truck: &TruckCode) -> Option<(&Truck, &Route)> {
        let i = self.trucks.iter().position(|t| &t.code == truck)?;
        Some((&self.trucks[i], &self.routes[i]))
    }

    #[inline]
    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Replace the whole cycle state with `solution`.  Delivered volumes of
    /// orders that appear in both books are carried forward.  The caller owns
    /// the generation bookkeeping.
    pub(crate) fn install(&mut self, solution: Solution) {
        let Solution {
            mut assignments,
            mut orders,
            unassigned,
            warehouses,
            blockages,
            interval_start,
            ..
        } = solution;
        assignments.sort_by(|a, b| a.truck.code.cmp(&b.truck.code));
        let (trucks, routes): (Vec<Truck>, Vec<Route>) =
            assignments.into_iter().map(|a| (a.truck, a.route)).unzip();

        orders.carry_forward_from(&self.orders);

        self.trucks = trucks;
        self.routes = routes;
        self.orders = orders;
        self.warehouses = warehouses;
        self.blockages = blockages;
        self.unassigned = unassigned;
        self.next = None;
        self.prefetch_requested = false;
        self.steps_remaining = self.clock.steps_per_cycle;
        self.clock.restart_at(interval_start);
        tracing::info!(
            generation = self.generation,
            trucks = self.trucks.len(),
            orders = self.orders.len(),
            start = %interval_start,
            "solution adopted"
        );
    }

    fn hand_off(&mut self, next: Solution) {
        self.generation += 1;
        self.cycles_completed += 1;
        self.install(next);
    }

    fn advance_all(&mut self) -> Vec<StepOutcome> {
        let cx = StepContext {
            warehouses: &self.warehouses,
            load:       self.load,
            tolerance:  self.config.delivery_tolerance,
            sink:       self.sink.as_ref(),
        };

        #[cfg(not(feature = "parallel"))]
        let mut outcomes: Vec<StepOutcome> = self
            .trucks
            .iter_mut()
            .zip(&self.routes)
            .map(|(truck, route)| advance_truck(truck, route, &cx))
            .collect();

        #[cfg(feature = "parallel")]
        let mut outcomes: Vec<StepOutcome> = {
            use rayon::prelude::*;
            self.trucks
                .par_iter_mut()
                .zip(self.routes.par_iter())
                .map(|(truck, route)| advance_truck(truck, route, &cx))
                .collect()
        };

        for (truck, outcome) in self.trucks.iter_mut().zip(outcomes.iter_mut()) {
            settle_deliveries(truck, outcome, &mut self.orders, &cx);
        }
        outcomes
    }
}
