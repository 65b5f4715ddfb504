//! `gf-core` — foundational types for the `gasfleet` simulation engine.
//!
//! This crate is a dependency of every other `gf-*` crate.  It intentionally
//! has no `gf-*` dependencies and minimal external ones (`chrono`,
//! `thiserror`, `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `TruckCode`, `OrderCode`, `WarehouseCode`                 |
//! | [`grid`]        | `GridPoint`, the `"(x,y)"` node codec                     |
//! | [`time`]        | `Step`, `CycleClock`, midnight detection                  |
//! | [`diag`]        | `Diagnostic`, `DiagnosticSink`, tracing/collecting sinks  |
//! | [`config`]      | `EngineConfig`                                            |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `gf-intake` and `gf-output`.                   |

pub mod config;
pub mod diag;
pub mod error;
pub mod grid;
pub mod ids;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EngineConfig;
pub use diag::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::{CoreError, CoreResult};
pub use grid::{GridPoint, format_route, parse_node_lossy, parse_route_lossy};
pub use ids::{OrderCode, TruckCode, WarehouseCode};
pub use time::{CycleClock, Step, crosses_midnight};
