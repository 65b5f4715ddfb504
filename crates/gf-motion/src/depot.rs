//! Central-warehouse status rule.
//!
//! A truck counts as "at the depot" only after two consecutive steps on a
//! central warehouse node (arrival plus one more), and as "en route" only
//! after two consecutive steps off it.  This avoids flicker when a route
//! merely passes through the depot.
//!
//! ```text
//!             prev = depot ∧ cur = depot
//!   EnRoute ──────────────────────────────▶ Available
//!           ◀──────────────────────────────
//!             prev ≠ depot ∧ cur ≠ depot
//! ```
//!
//! Every other status (broken, maintenance) passes through untouched.

use gf_core::GridPoint;
use gf_fleet::{TruckStatus, Warehouse, is_central_node};

/// Apply the depot rule to `status` given the node before and after a step.
pub fn depot_transition(
    status:     TruckStatus,
    previous:   GridPoint,
    current:    GridPoint,
    warehouses: &[Warehouse],
) -> TruckStatus {
    let prev_at = is_central_node(warehouses, previous);
    let cur_at  = is_central_node(warehouses, current);
    match status {
        TruckStatus::EnRoute if prev_at && cur_at => TruckStatus::Available,
        TruckStatus::Available if !prev_at && !cur_at => TruckStatus::EnRoute,
        other => other,
    }
}
