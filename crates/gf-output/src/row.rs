//! Plain data rows written by output backends.

use chrono::NaiveDateTime;
use serde::Serialize;

use gf_fleet::TruckStatus;
use gf_sim::{Cycle, TickReport};

/// Summary of one cycle tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummaryRow {
    pub generation:      u64,
    pub step:            u64,
    pub sim_time:        NaiveDateTime,
    pub steps_remaining: u32,
    pub active_trucks:   u32,
    pub broken_trucks:   u32,
    /// Gas credited to orders during the tick, m³.
    pub delivered_m3:    f64,
    pub breakdowns:      u32,
    pub prefetch_due:    bool,
    pub handoff:         bool,
    pub exhausted:       bool,
}

impl TickSummaryRow {
    /// Summarize `report`.  Truck counts and the generation are read from
    /// `cycle` as it stands after the tick.
    pub fn from_tick(cycle: &Cycle, report: &TickReport) -> Self {
        let count = |pred: fn(TruckStatus) -> bool| {
            cycle.trucks.iter().filter(|t| pred(t.status)).count() as u32
        };
        let delivered_m3: f64 = report
            .outcomes
            .iter()
            .flat_map(|o| &o.deliveries)
            .map(|d| d.volume_m3)
            .sum();
        Self {
            generation: cycle.generation(),
            step: report.step.0,
            sim_time: report.now,
            steps_remaining: report.steps_remaining,
            active_trucks: count(TruckStatus::is_active),
            broken_trucks: count(|s| s == TruckStatus::Broken),
            delivered_m3,
            breakdowns: report.breakdowns.len() as u32,
            prefetch_due: report.prefetch_due.is_some(),
            handoff: report.handoff.is_some(),
            exhausted: report.exhausted,
        }
    }
}
