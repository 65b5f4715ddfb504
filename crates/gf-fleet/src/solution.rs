//! The normalized routing solution handed from intake to the cycle
//! controller.

use chrono::NaiveDateTime;

use gf_core::OrderCode;

use crate::{Blockage, OrderBook, Route, Truck, Warehouse};

/// One truck and the route it must follow this cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub truck: Truck,
    pub route: Route,
}

/// A complete, self-contained solution for one cycle.
///
/// Ownership moves from the intake layer to the cycle controller at
/// hand-off; nothing in it is shared with the previous solution.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    pub assignments:    Vec<Assignment>,
    pub orders:         OrderBook,
    /// Orders the solver could not place this cycle.
    pub unassigned:     Vec<OrderCode>,
    pub warehouses:     Vec<Warehouse>,
    pub blockages:      Vec<Blockage>,
    pub interval_start: NaiveDateTime,
    pub interval_end:   NaiveDateTime,
    /// The solver's notion of "now" when it produced the solution.
    pub simulated_time: NaiveDateTime,
}

impl Solution {
    /// A solution with at least one route assignment.  Anything else means
    /// "not ready yet".
    #[inline]
    pub fn is_structurally_valid(&self) -> bool {
        !self.assignments.is_empty()
    }
}
