//! Advance one truck by one route node.
//!
//! The step is split in two phases so the cycle controller can run the
//! truck-local part in parallel:
//!
//! 1. [`advance_truck`] — touches only the truck: movement, recharge, fuel,
//!    status, breakdown tags.  Records which route orders it may deliver.
//! 2. [`settle_deliveries`] — credits those claims against the shared
//!    [`OrderBook`] and unloads the delivered gas from the truck.
//!
//! [`step_truck`] runs both back to back.

use gf_core::{Diagnostic, DiagnosticKind, DiagnosticSink, GridPoint, OrderCode};
use gf_fleet::{
    LoadModel, NodeTag, OrderBook, Route, Truck, TruckStatus, Warehouse, is_central_node,
};

use crate::depot::depot_transition;

/// Read-only inputs shared by every truck in a tick.
#[derive(Copy, Clone)]
pub struct StepContext<'a> {
    pub warehouses: &'a [Warehouse],
    pub load:       LoadModel,
    pub tolerance:  f64,
    pub sink:       &'a dyn DiagnosticSink,
}

/// A delivery the truck is entitled to make at the node it just reached.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryClaim {
    pub order:     OrderCode,
    pub volume_m3: f64,
}

/// Gas actually credited to an order.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub order:     OrderCode,
    pub volume_m3: f64,
}

/// What happened to one truck in one step.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StepOutcome {
    /// The truck was broken on entry and did nothing.
    pub skipped:       bool,
    /// Location changed.
    pub moved:         bool,
    /// The progress pointer reached a new route index.  Only then are the
    /// orders at that node delivered.
    pub advanced:      bool,
    pub recharged:     bool,
    pub fuel_used_gal: f64,
    pub claims:        Vec<DeliveryClaim>,
    pub deliveries:    Vec<Delivery>,
    /// Severity of a breakdown triggered by a node tag.
    pub breakdown:     Option<u8>,
    pub status_before: TruckStatus,
    pub status_after:  TruckStatus,
    pub reached:       GridPoint,
}

impl StepOutcome {
    /// `true` when the truck became broken during this step.
    #[inline]
    pub fn broke_down(&self) -> bool {
        self.status_before != TruckStatus::Broken && self.status_after == TruckStatus::Broken
    }
}

/// Truck-local phase of a step.  See the module docs.
pub fn advance_truck(truck: &mut Truck, route: &Route, ctx: &StepContext<'_>) -> StepOutcome {
    let status_before = truck.status;

    // ① Broken trucks never advance.
    if truck.status == TruckStatus::Broken {
        return StepOutcome {
            skipped: true,
            status_before,
            status_after: status_before,
            reached: truck.location,
            ..StepOutcome::default()
        };
    }

    if truck.refresh_derived(ctx.load) {
        report_corruption(truck, ctx.sink, "on entry");
    }

    let previous = truck.location;
    let progress_before = truck.progress;

    // ②/③ Move the progress pointer.
    let target_index = if route.is_degenerate() {
        truck.progress = 1;
        0
    } else {
        let next = truck.progress.saturating_add(1);
        if next >= route.len() {
            truck.progress = route.len() - 1;
        } else {
            truck.progress = next;
        }
        truck.progress
    };
    let target = route.node(target_index).unwrap_or_else(|| route.last());
    truck.location = target;
    let moved = target != previous;
    // A clamped or pinned truck reaches no new node.
    let advanced = truck.progress != progress_before;

    let mut outcome = StepOutcome {
        moved,
        advanced,
        status_before,
        reached: target,
        ..StepOutcome::default()
    };

    // ④ Recharge at the depot; excludes consumption and delivery.
    if is_central_node(ctx.warehouses, target) {
        truck.recharge();
        outcome.recharged = true;
    } else {
        // ⑤ Burn fuel for one grid unit.
        if moved {
            let used = truck.fuel_per_step();
            let before = truck.fuel_gal;
            truck.fuel_gal = (truck.fuel_gal - used).max(0.0);
            outcome.fuel_used_gal = before - truck.fuel_gal;
        }
        // ⑥ Record delivery entitlements at a newly reached node.
        if advanced {
            outcome.claims = route
                .orders_at(target)
                .filter(|o| o.volume_m3 > ctx.tolerance)
                .map(|o| DeliveryClaim { order: o.code.clone(), volume_m3: o.volume_m3 })
                .collect();
        }
    }

    // ⑦ Derived quantities follow fuel/cargo.
    if truck.refresh_derived(ctx.load) {
        report_corruption(truck, ctx.sink, "after step");
    }

    // ⑧ Status.
    if truck.fuel_gal <= 0.0 {
        truck.status = TruckStatus::Broken;
        tracing::info!(truck = %truck.code, at = %target, "fuel exhausted, truck immobilized");
    } else {
        truck.status = depot_transition(truck.status, previous, target, ctx.warehouses);
        if moved {
            if let NodeTag::BreakdownTrigger { severity } = route.tag(target_index) {
                truck.status = TruckStatus::Broken;
                outcome.breakdown = Some(severity);
                tracing::info!(truck = %truck.code, at = %target, severity, "scripted breakdown");
            }
        }
    }

    outcome.status_after = truck.status;
    outcome
}

/// Apply the delivery claims of `outcome` to `orders` and unload the truck.
///
/// Only orders with strictly positive remaining volume are credited; the
/// credited amount is bounded by the route's share and the order's
/// remaining volume, so `delivered <= assigned` always holds.  Cargo is not a
/// bound: crediting more than the truck carries is reported as
/// [`DiagnosticKind::CargoShortfall`].
pub fn settle_deliveries(
    truck:   &mut Truck,
    outcome: &mut StepOutcome,
    orders:  &mut OrderBook,
    ctx:     &StepContext<'_>,
) {
    if outcome.claims.is_empty() {
        return;
    }

    let mut unloaded = 0.0;
    for claim in std::mem::take(&mut outcome.claims) {
        let Some(order) = orders.get_mut(&claim.order) else {
            ctx.sink.report(Diagnostic::new(
                DiagnosticKind::StructuralViolation,
                claim.order.as_str(),
                format!("route of truck {} references an order absent from the book", truck.code),
            ));
            continue;
        };
        if order.remaining() <= ctx.tolerance {
            continue;
        }
        let credited = order.deliver(claim.volume_m3);
        if credited > 0.0 {
            unloaded += credited;
            tracing::debug!(truck = %truck.code, order = %claim.order, volume = credited, "delivered");
            outcome.deliveries.push(Delivery { order: claim.order, volume_m3: credited });
        }
    }

    if unloaded > 0.0 {
        if unloaded > truck.cargo_m3 + ctx.tolerance {
            ctx.sink.report(Diagnostic::new(
                DiagnosticKind::CargoShortfall,
                truck.code.as_str(),
                format!(
                    "credited {unloaded:.3} m3 with only {:.3} m3 on board; cargo floored at 0",
                    truck.cargo_m3
                ),
            ));
        }
        truck.cargo_m3 = (truck.cargo_m3 - unloaded).max(0.0);
        if truck.refresh_derived(ctx.load) {
            report_corruption(truck, ctx.sink, "after delivery");
        }
    }
}

/// Advance `truck` one node along `route`, delivering against `orders`.
pub fn step_truck(
    truck:  &mut Truck,
    route:  &Route,
    orders: &mut OrderBook,
    ctx:    &StepContext<'_>,
) -> StepOutcome {
    let mut outcome = advance_truck(truck, route, ctx);
    settle_deliveries(truck, &mut outcome, orders, ctx);
    outcome
}

fn report_corruption(truck: &Truck, sink: &dyn DiagnosticSink, phase: &str) {
    sink.report(Diagnostic::new(
        DiagnosticKind::NumericCorruption,
        truck.code.as_str(),
        format!("non-finite or negative physical value {phase}; clamped to 0"),
    ));
}
