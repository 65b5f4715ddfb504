//! `gf-output` — rendering snapshots and export for the gasfleet engine.
//!
//! [`RenderSnapshot::capture`] turns a `gf_sim::Cycle` (plus, optionally,
//! the render loop's `LegClocks`) into plain serde-serializable views.
//! Two export backends write snapshots and per-tick summaries to disk:
//!
//! | Backend             | Files created                                                   |
//! |---------------------|-----------------------------------------------------------------|
//! | [`CsvWriter`]       | `trucks.csv`, `orders.csv`, `warehouses.csv`, `tick_summaries.csv` |
//! | [`JsonLinesWriter`] | `snapshots.jsonl`, `tick_summaries.jsonl`                       |
//!
//! Both implement [`OutputWriter`] and are driven by [`SnapshotObserver`],
//! which implements `gf_sim::CycleObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gf_output::{CsvWriter, SnapshotObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let obs = SnapshotObserver::new(writer, 10);
//! let mut runner = Runner::new(config, intake, start, obs)?;
//! // ... run ...
//! runner.observer_mut().finish();
//! runner.observer_mut().take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod jsonl;
pub mod observer;
pub mod row;
pub mod snapshot;
pub mod writer;

#[cfg(test)]
mod tests;

pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use jsonl::JsonLinesWriter;
pub use observer::SnapshotObserver;
pub use row::TickSummaryRow;
pub use snapshot::{BlockageView, OrderView, Reading, RenderSnapshot, TruckView, WarehouseView};
pub use writer::OutputWriter;
