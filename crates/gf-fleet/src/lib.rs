//! `gf-fleet` — the strongly typed records the engine advances.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                       |
//! |---------------|----------------------------------------------------------------|
//! | [`truck`]     | `Truck`, `TruckStatus`, `VehicleClass`, `Derived`              |
//! | [`physics`]   | Load/combined weight, fuel per distance, range (pure)          |
//! | [`route`]     | `Route`, `RouteOrder`, `NodeTag`                               |
//! | [`order`]     | `Order`, `OrderStatus`, `OrderBook`                            |
//! | [`warehouse`] | `Warehouse`, `WarehouseKind`, `Blockage`, depot helpers        |
//! | [`solution`]  | `Solution`, `Assignment` — one cycle's self-contained input    |
//! | [`error`]     | `FleetError`, `FleetResult<T>`                                 |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                           |
//! |-----------|--------------------------------------------------|
//! | `serde`   | `Serialize`/`Deserialize` on all public records. |
//! | `fx-hash` | FxHash for the `OrderBook` map.                  |

pub mod error;
pub mod order;
pub mod physics;
pub mod route;
pub mod solution;
pub mod truck;
pub mod warehouse;


pub use error::{FleetError, FleetResult};
pub use order::{Order, OrderBook, OrderStatus};
pub use physics::{Checked, LoadModel};
pub use route::{NodeTag, Route, RouteOrder};
pub use solution::{Assignment, Solution};
pub use truck::{ClassSpec, Derived, Truck, TruckStatus, VehicleClass};
pub use warehouse::{
    Blockage, Warehouse, WarehouseKind, central_depot, is_central_node, replenish_secondaries,
};
