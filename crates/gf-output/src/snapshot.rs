//! Read-only view of a cycle for rendering and export.
//!
//! A [`RenderSnapshot`] is a plain copy: building one never mutates the
//! cycle, and the snapshot does not borrow from it.

use std::fmt;
use std::time::Instant;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use gf_core::GridPoint;
use gf_fleet::{Truck, TruckStatus};
use gf_motion::{LegClocks, Pose};
use gf_sim::Cycle;

// ── Reading ───────────────────────────────────────────────────────────────────

/// A gauge value as shown to the operator: a percentage, or `ERROR` when
/// the underlying numbers are corrupted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reading {
    Percent(f64),
    Error,
}

impl Reading {
    /// `ratio` in `[0, 1]` as a percentage.  `faulted` or a missing ratio
    /// yields [`Reading::Error`].
    pub fn from_ratio(ratio: Option<f64>, faulted: bool) -> Self {
        match ratio {
            Some(r) if !faulted && r.is_finite() => Reading::Percent(r * 100.0),
            _ => Reading::Error,
        }
    }

    pub fn percent(self) -> Option<f64> {
        match self {
            Reading::Percent(p) => Some(p),
            Reading::Error => None,
        }
    }

    #[inline]
    pub fn is_error(self) -> bool {
        self == Reading::Error
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Percent(p) => write!(f, "{p:.1}"),
            Reading::Error => f.write_str("ERROR"),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Percent(p) => serializer.serialize_f64(*p),
            Reading::Error => serializer.serialize_str("ERROR"),
        }
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckView {
    pub code:        String,
    /// Interpolated position; equals the occupied node when not in motion.
    pub x:           f64,
    pub y:           f64,
    pub heading_deg: f64,
    /// Node the truck occupies in the discrete simulation.
    pub node:        GridPoint,
    pub status:      &'static str,
    pub cargo_pct:   Reading,
    pub fuel_pct:    Reading,
    pub in_motion:   bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub code:         String,
    pub location:     GridPoint,
    pub status:       &'static str,
    pub assigned_m3:  f64,
    pub delivered_m3: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseView {
    pub code:     String,
    pub location: GridPoint,
    pub kind:     &'static str,
    pub gas_pct:  Reading,
    pub fuel_pct: Reading,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockageView {
    pub nodes: Vec<GridPoint>,
    pub start: NaiveDateTime,
    pub end:   NaiveDateTime,
}

/// Everything a view needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub generation:       u64,
    pub step:             u64,
    pub steps_remaining:  u32,
    pub cycles_completed: u64,
    pub sim_time:         NaiveDateTime,
    pub trucks:           Vec<TruckView>,
    pub orders:           Vec<OrderView>,
    pub warehouses:       Vec<WarehouseView>,
    /// Only blockages active at `sim_time`.
    pub blockages:        Vec<BlockageView>,
}

impl RenderSnapshot {
    /// Snapshot `cycle`.
    ///
    /// With `legs`, trucks are placed by the interpolator at the given
    /// instant; without, every truck sits on its node.  Broken trucks are
    /// always parked.
    pub fn capture(cycle: &Cycle, legs: Option<(&LegClocks, Instant)>) -> Self {
        let status = cycle.status();
        let now = status.now;
        let tolerance = cycle.config.delivery_tolerance;

        let trucks = cycle
            .trucks
            .iter()
            .zip(&cycle.routes)
            .map(|(truck, route)| {
                let pose = match legs {
                    Some((legs, at)) if truck.status != TruckStatus::Broken => {
                        legs.pose(&truck.code, route.nodes(), at)
                    }
                    _ => Pose::parked(truck.location, truck.progress),
                };
                truck_view(truck, pose)
            })
            .collect();

        let orders = cycle
            .orders
            .sorted()
            .into_iter()
            .map(|o| OrderView {
                code:         o.code.as_str().to_owned(),
                location:     o.location,
                status:       o.status(now, tolerance).as_str(),
                assigned_m3:  o.assigned_m3,
                delivered_m3: o.delivered_m3,
            })
            .collect();

        let warehouses = cycle
            .warehouses
            .iter()
            .map(|w| WarehouseView {
                code:     w.code.as_str().to_owned(),
                location: w.location,
                kind:     w.kind.as_str(),
                gas_pct:  Reading::from_ratio(w.gas_ratio(), false),
                fuel_pct: Reading::from_ratio(w.fuel_ratio(), false),
            })
            .collect();

        let blockages = cycle
            .blockages
            .iter()
            .filter(|b| b.is_active(now))
            .map(|b| BlockageView { nodes: b.nodes.clone(), start: b.start, end: b.end })
            .collect();

        Self {
            generation: status.generation,
            step: status.step.0,
            steps_remaining: status.steps_remaining,
            cycles_completed: status.cycles_completed,
            sim_time: now,
            trucks,
            orders,
            warehouses,
            blockages,
        }
    }

    pub fn truck(&self, code: &str) -> Option<&TruckView> {
        self.trucks.iter().find(|t| t.code == code)
    }
}

fn truck_view(truck: &Truck, pose: Pose) -> TruckView {
    let faulted = truck.faulted || truck.derived.corrupted;
    TruckView {
        code:        truck.code.as_str().to_owned(),
        x:           pose.x,
        y:           pose.y,
        heading_deg: pose.heading_deg,
        node:        truck.location,
        status:      truck.status.as_str(),
        cargo_pct:   Reading::from_ratio(truck.cargo_ratio(), faulted),
        fuel_pct:    Reading::from_ratio(truck.fuel_ratio(), faulted),
        in_motion:   pose.in_motion,
    }
}
