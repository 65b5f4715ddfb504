//! `gf-motion` — advancing trucks along their routes.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                           |
//! |------------|--------------------------------------------------------------------|
//! | [`step`]   | `advance_truck` / `settle_deliveries` / `step_truck`, `StepOutcome`|
//! | [`depot`]  | `depot_transition` — the two-step central-warehouse status rule    |
//! | [`interp`] | `Pose`, `pose_at`, `LegClocks` — render-only interpolation         |
//!
//! # Movement model (one node per step)
//!
//! Every step moves a truck exactly one route node.  Grid steps are unit
//! length, so one move costs one unit of fuel consumption at the truck's
//! current combined weight.  Arriving on a central warehouse recharges the
//! truck instead of burning fuel or delivering.
//!
//! For visualization, [`interp::pose_at`] turns wall-clock time since a leg
//! began into a fractional position and heading.  It never touches the
//! authoritative truck state.

pub mod depot;
pub mod interp;
pub mod step;


pub use depot::depot_transition;
pub use interp::{LegClocks, Pose, pose_at, pose_between};
pub use step::{
    Delivery, DeliveryClaim, StepContext, StepOutcome, advance_truck, settle_deliveries,
    step_truck,
};
