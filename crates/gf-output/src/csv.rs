//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `trucks.csv`
//! - `orders.csv`
//! - `warehouses.csv`
//! - `tick_summaries.csv`
//!
//! Gauges that cannot be trusted are written as `ERROR`.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, RenderSnapshot, TickSummaryRow};

const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// Writes snapshots and tick summaries to four CSV files.
pub struct CsvWriter {
    trucks:     Writer<File>,
    orders:     Writer<File>,
    warehouses: Writer<File>,
    summaries:  Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trucks = Writer::from_path(dir.join("trucks.csv"))?;
        trucks.write_record([
            "generation", "step", "sim_time", "code", "x", "y", "heading_deg", "node_x", "node_y",
            "status", "cargo_pct", "fuel_pct", "in_motion",
        ])?;

        let mut orders = Writer::from_path(dir.join("orders.csv"))?;
        orders.write_record([
            "generation", "step", "code", "x", "y", "status", "assigned_m3", "delivered_m3",
        ])?;

        let mut warehouses = Writer::from_path(dir.join("warehouses.csv"))?;
        warehouses.write_record(["generation", "step", "code", "x", "y", "kind", "gas_pct", "fuel_pct"])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record([
            "generation", "step", "sim_time", "steps_remaining", "active_trucks", "broken_trucks",
            "delivered_m3", "breakdowns", "prefetch_due", "handoff", "exhausted",
        ])?;

        tracing::debug!(dir = %dir.display(), "csv output opened");
        Ok(Self { trucks, orders, warehouses, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshot(&mut self, snap: &RenderSnapshot) -> OutputResult<()> {
        let generation = snap.generation.to_string();
        let step = snap.step.to_string();
        let sim_time = snap.sim_time.format(TIME_FMT).to_string();

        for t in &snap.trucks {
            self.trucks.write_record(&[
                generation.clone(),
                step.clone(),
                sim_time.clone(),
                t.code.clone(),
                format!("{:.3}", t.x),
                format!("{:.3}", t.y),
                format!("{:.1}", t.heading_deg),
                t.node.x.to_string(),
                t.node.y.to_string(),
                t.status.to_owned(),
                t.cargo_pct.to_string(),
                t.fuel_pct.to_string(),
                (t.in_motion as u8).to_string(),
            ])?;
        }
        for o in &snap.orders {
            self.orders.write_record(&[
                generation.clone(),
                step.clone(),
                o.code.clone(),
                o.location.x.to_string(),
                o.location.y.to_string(),
                o.status.to_owned(),
                o.assigned_m3.to_string(),
                o.delivered_m3.to_string(),
            ])?;
        }
        for w in &snap.warehouses {
            self.warehouses.write_record(&[
                generation.clone(),
                step.clone(),
                w.code.clone(),
                w.location.x.to_string(),
                w.location.y.to_string(),
                w.kind.to_owned(),
                w.gas_pct.to_string(),
                w.fuel_pct.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.generation.to_string(),
            row.step.to_string(),
            row.sim_time.format(TIME_FMT).to_string(),
            row.steps_remaining.to_string(),
            row.active_trucks.to_string(),
            row.broken_trucks.to_string(),
            row.delivered_m3.to_string(),
            row.breakdowns.to_string(),
            (row.prefetch_due as u8).to_string(),
            (row.handoff as u8).to_string(),
            (row.exhausted as u8).to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trucks.flush()?;
        self.orders.flush()?;
        self.warehouses.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
