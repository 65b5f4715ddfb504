//! Warehouses and blockages.

use chrono::NaiveDateTime;

use gf_core::{GridPoint, WarehouseCode};

use crate::truck::ratio;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarehouseKind {
    /// The depot: recharges any truck that stops on it, never replenished.
    Central,
    /// Intermediate storage refilled once per simulated day at midnight.
    Secondary,
}

impl WarehouseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarehouseKind::Central   => "CENTRAL",
            WarehouseKind::Secondary => "SECONDARY",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warehouse {
    pub code:         WarehouseCode,
    pub kind:         WarehouseKind,
    pub location:     GridPoint,
    pub gas_m3:       f64,
    pub max_gas_m3:   f64,
    pub fuel_gal:     f64,
    pub max_fuel_gal: f64,
}

impl Warehouse {
    #[inline]
    pub fn is_central(&self) -> bool {
        self.kind == WarehouseKind::Central
    }

    /// Refill gas and fuel to maximum.
    pub fn replenish(&mut self) {
        self.gas_m3 = self.max_gas_m3;
        self.fuel_gal = self.max_fuel_gal;
    }

    pub fn gas_ratio(&self) -> Option<f64> {
        ratio(self.gas_m3, self.max_gas_m3)
    }

    pub fn fuel_ratio(&self) -> Option<f64> {
        ratio(self.fuel_gal, self.max_fuel_gal)
    }
}

/// `true` if `node` is the location of any central warehouse.
pub fn is_central_node(warehouses: &[Warehouse], node: GridPoint) -> bool {
    warehouses.iter().any(|w| w.is_central() && w.location == node)
}

/// Location of the first central warehouse, if any.
pub fn central_depot(warehouses: &[Warehouse]) -> Option<GridPoint> {
    warehouses.iter().find(|w| w.is_central()).map(|w| w.location)
}

/// Refill every secondary warehouse; returns how many were refilled.
pub fn replenish_secondaries(warehouses: &mut [Warehouse]) -> usize {
    let mut n = 0;
    for w in warehouses.iter_mut().filter(|w| !w.is_central()) {
        w.replenish();
        n += 1;
    }
    n
}

// ── Blockage ──────────────────────────────────────────────────────────────────

/// A road closure: a polygon of grid nodes valid over `[start, end)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blockage {
    pub nodes: Vec<GridPoint>,
    pub start: NaiveDateTime,
    pub end:   NaiveDateTime,
}

impl Blockage {
    #[inline]
    pub fn is_active(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}
