//! Customer orders and the order book.

use std::fmt;

use chrono::NaiveDateTime;

use gf_core::{GridPoint, OrderCode};

#[cfg(feature = "fx-hash")]
type OrderMap = rustc_hash::FxHashMap<OrderCode, Order>;
#[cfg(not(feature = "fx-hash"))]
type OrderMap = std::collections::HashMap<OrderCode, Order>;

/// A customer order, mutated in place as trucks deliver against it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub code:         OrderCode,
    pub location:     GridPoint,
    pub assigned_m3:  f64,
    pub delivered_m3: f64,
    pub deadline:     Option<NaiveDateTime>,
}

/// Derived order status for views.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Late,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending    => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed  => "COMPLETED",
            OrderStatus::Late       => "LATE",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Order {
    pub fn new(code: OrderCode, location: GridPoint, assigned_m3: f64) -> Self {
        Self { code, location, assigned_m3, delivered_m3: 0.0, deadline: None }
    }

    /// Volume still owed, never negative.
    #[inline]
    pub fn remaining(&self) -> f64 {
        (self.assigned_m3 - self.delivered_m3).max(0.0)
    }

    #[inline]
    pub fn is_satisfied(&self, tolerance: f64) -> bool {
        self.delivered_m3 >= self.assigned_m3 - tolerance
    }

    /// Deliver up to `amount`; returns what was actually credited.
    ///
    /// `delivered_m3` never exceeds `assigned_m3`.
    pub fn deliver(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let credited = amount.min(self.remaining());
        self.delivered_m3 = (self.delivered_m3 + credited).min(self.assigned_m3);
        credited
    }

    pub fn status(&self, now: NaiveDateTime, tolerance: f64) -> OrderStatus {
        if self.is_satisfied(tolerance) {
            OrderStatus::Completed
        } else if self.deadline.is_some_and(|d| d < now) {
            OrderStatus::Late
        } else if self.delivered_m3 > tolerance {
            OrderStatus::InProgress
        } else {
            OrderStatus::Pending
        }
    }
}

// ── OrderBook ─────────────────────────────────────────────────────────────────

/// All orders known to the active cycle, keyed by code.
#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    orders: OrderMap,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order.
    pub fn insert(&mut self, order: Order) {
        self.orders.insert(order.code.clone(), order);
    }

    #[inline]
    pub fn get(&self, code: &OrderCode) -> Option<&Order> {
        self.orders.get(code)
    }

    #[inline]
    pub fn get_mut(&mut self, code: &OrderCode) -> Option<&mut Order> {
        self.orders.get_mut(code)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Orders sorted by code, for deterministic output.
    pub fn sorted(&self) -> Vec<&Order> {
        let mut v: Vec<&Order> = self.orders.values().collect();
        v.sort_by(|a, b| a.code.cmp(&b.code));
        v
    }

    /// Carry delivered volumes forward from the previous cycle's book.
    ///
    /// A fresh solution may report stale delivered volumes for orders that
    /// were served during the cycle it was computed in.  The larger of the
    /// two figures wins, still bounded by the assigned volume.
    pub fn carry_forward_from(&mut self, previous: &OrderBook) {
        for (code, order) in self.orders.iter_mut() {
            if let Some(prev) = previous.get(code) {
                if prev.delivered_m3 > order.delivered_m3 {
                    order.delivered_m3 = prev.delivered_m3.min(order.assigned_m3);
                }
            }
        }
    }
}
