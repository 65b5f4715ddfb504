//! Solver response wire format.
//!
//! The solver replies with camelCase JSON.  Every field is optional or
//! defaulted on the way in: [`crate::normalize`] decides what a missing or
//! malformed value degrades to, so a single bad record never rejects the
//! whole response.
//!
//! ```json
//! {
//!   "chromosome": [{
//!     "truck": { "code": "TA01", "class": "TA", "location": "(12,8)", "fuelGal": 25.0 },
//!     "route": ["(12,8)", "(13,8)"],
//!     "destination": "(13,8)",
//!     "orders": [{ "code": "P1", "location": "(13,8)", "assignedM3": 5.0, "volumeM3": 5.0 }],
//!     "tags": [{ "index": 1, "breakdown": 2 }]
//!   }],
//!   "unassignedOrders": [],
//!   "blockages": [{ "nodes": ["(20,20)", "(20,25)"], "start": "2025-01-01T00:00:00", "end": "2025-01-01T06:00:00" }],
//!   "warehouses": [{ "code": "CENTRAL", "kind": "CENTRAL", "location": "(12,8)" }],
//!   "intervalStart": "2025-01-01T00:00:00",
//!   "intervalEnd": "2025-01-01T02:00:00",
//!   "simulatedTime": "2025-01-01T00:00:00"
//! }
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Top-level solver reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverResponse {
    pub chromosome:        Vec<GeneDto>,
    pub unassigned_orders: Vec<OrderDto>,
    pub blockages:         Vec<BlockageDto>,
    pub warehouses:        Vec<WarehouseDto>,
    pub interval_start:    Option<NaiveDateTime>,
    pub interval_end:      Option<NaiveDateTime>,
    pub simulated_time:    Option<NaiveDateTime>,
}

/// One truck-to-route assignment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneDto {
    /// Full truck record.  May be absent when the solver only names the
    /// truck through `truck_code`.
    pub truck:       Option<TruckDto>,
    pub truck_code:  Option<String>,
    #[serde(alias = "nodes")]
    pub route:       Vec<String>,
    pub destination: Option<String>,
    pub orders:      Vec<OrderDto>,
    pub tags:        Vec<TagDto>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TruckDto {
    pub code:         String,
    #[serde(alias = "type")]
    pub class:        Option<String>,
    pub location:     Option<String>,
    pub status:       Option<String>,
    pub cargo_m3:     Option<f64>,
    pub max_cargo_m3: Option<f64>,
    pub fuel_gal:     Option<f64>,
    pub max_fuel_gal: Option<f64>,
    pub tare_t:       Option<f64>,
    pub speed_kmh:    Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderDto {
    pub code:         String,
    pub location:     String,
    /// Total volume the customer ordered.
    pub assigned_m3:  f64,
    pub delivered_m3: f64,
    pub deadline:     Option<NaiveDateTime>,
    /// Share of the order carried by this route.  Defaults to the
    /// order's remaining volume.
    pub volume_m3:    Option<f64>,
}

/// Sparse per-node tag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagDto {
    pub index:     usize,
    /// Breakdown severity triggered on reaching the node.
    pub breakdown: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockageDto {
    pub nodes: Vec<String>,
    pub start: Option<NaiveDateTime>,
    pub end:   Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarehouseDto {
    pub code:         String,
    #[serde(alias = "type")]
    pub kind:         String,
    pub location:     String,
    pub gas_m3:       Option<f64>,
    pub max_gas_m3:   Option<f64>,
    pub fuel_gal:     Option<f64>,
    pub max_fuel_gal: Option<f64>,
}

impl SolverResponse {
    /// Decode a JSON body.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}
