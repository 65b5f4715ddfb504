//! Integration tests for gf-output.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use gf_core::{EngineConfig, GridPoint, OrderCode, TruckCode, WarehouseCode};
use gf_fleet::{
    Assignment, Blockage, Order, OrderBook, Route, RouteOrder, Solution, Truck, VehicleClass,
    Warehouse, WarehouseKind,
};
use gf_sim::{Cycle, CycleBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DEPOT: GridPoint = GridPoint { x: 12, y: 8 };

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn cycle() -> Cycle {
    let code = TruckCode::new("TA01");
    let route = Route::new(
        code.clone(),
        vec![DEPOT, GridPoint::new(13, 8), GridPoint::new(14, 8)],
        GridPoint::new(14, 8),
        vec![RouteOrder { code: OrderCode::new("P1"), location: GridPoint::new(14, 8), volume_m3: 5.0 }],
        vec![],
    )
    .unwrap();
    let mut orders = OrderBook::new();
    orders.insert(Order::new(OrderCode::new("P1"), GridPoint::new(14, 8), 5.0));
    let solution = Solution {
        assignments: vec![Assignment { truck: Truck::new(code, VehicleClass::TA, DEPOT), route }],
        orders,
        warehouses: vec![Warehouse {
            code:         WarehouseCode::new("CENTRAL"),
            kind:         WarehouseKind::Central,
            location:     DEPOT,
            gas_m3:       250.0,
            max_gas_m3:   1_000.0,
            fuel_gal:     1_000.0,
            max_fuel_gal: 1_000.0,
        }],
        blockages: vec![
            Blockage {
                nodes: vec![GridPoint::new(20, 20), GridPoint::new(20, 25)],
                start: t0() - TimeDelta::hours(1),
                end:   t0() + TimeDelta::hours(1),
            },
            Blockage {
                nodes: vec![GridPoint::new(30, 30)],
                start: t0() + TimeDelta::hours(5),
                end:   t0() + TimeDelta::hours(6),
            },
        ],
        interval_start: t0(),
        interval_end: t0() + TimeDelta::hours(2),
        simulated_time: t0(),
        ..Solution::default()
    };
    CycleBuilder::new(EngineConfig::default(), solution).build().unwrap()
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot_tests {
    use std::time::{Duration, Instant};

    use gf_fleet::TruckStatus;
    use gf_motion::LegClocks;
    use gf_sim::NoopObserver;

    use super::*;
    use crate::{Reading, RenderSnapshot};

    #[test]
    fn parked_trucks_sit_on_their_node() {
        let snap = RenderSnapshot::capture(&cycle(), None);
        let t = snap.truck("TA01").unwrap();
        assert_eq!((t.x, t.y), (12.0, 8.0));
        assert_eq!(t.node, DEPOT);
        assert_eq!(t.status, "AVAILABLE");
        assert_eq!(t.cargo_pct, Reading::Percent(100.0));
        assert!(!t.in_motion);
        assert_eq!(snap.steps_remaining, 140);
        assert_eq!(snap.sim_time, t0());
    }

    /// One tick moves TA01 from the depot onto (13,8); its render leg
    /// covers that segment.
    fn ticked_with_legs(start: Instant) -> (Cycle, LegClocks) {
        let mut cycle = cycle();
        let code = TruckCode::new("TA01");
        let mut legs = LegClocks::new(Duration::from_secs(1));
        legs.track(&code, cycle.trucks[0].progress, start);
        cycle.tick(&mut NoopObserver);
        assert!(legs.track(&code, cycle.trucks[0].progress, start));
        (cycle, legs)
    }

    #[test]
    fn interpolated_position_from_leg_clocks() {
        let start = Instant::now();
        let (cycle, legs) = ticked_with_legs(start);

        let snap = RenderSnapshot::capture(&cycle, Some((&legs, start + Duration::from_millis(500))));
        let t = snap.truck("TA01").unwrap();
        assert!((t.x - 12.5).abs() < 1e-9);
        assert!((t.y - 8.0).abs() < 1e-9);
        assert!(t.heading_deg.abs() < 1e-9);
        assert!(t.in_motion);
    }

    #[test]
    fn drawn_truck_stays_within_one_segment_of_its_node() {
        let start = Instant::now();
        let (cycle, legs) = ticked_with_legs(start);

        for ms in (0..=60_000).step_by(250) {
            let snap = RenderSnapshot::capture(&cycle, Some((&legs, start + Duration::from_millis(ms))));
            let t = snap.truck("TA01").unwrap();
            assert_eq!(t.node, GridPoint::new(13, 8));
            let gap = (t.x - 13.0).abs() + (t.y - 8.0).abs();
            assert!(gap <= 1.0 + 1e-9, "{ms} ms: drawn at ({}, {})", t.x, t.y);
        }

        let snap = RenderSnapshot::capture(&cycle, Some((&legs, start + Duration::from_secs(60))));
        let t = snap.truck("TA01").unwrap();
        assert_eq!((t.x, t.y), (13.0, 8.0));
        assert!(!t.in_motion);
    }

    #[test]
    fn broken_trucks_are_parked() {
        let mut cycle = cycle();
        cycle.trucks[0].status = TruckStatus::Broken;
        let start = Instant::now();
        let code = TruckCode::new("TA01");
        let mut legs = LegClocks::new(Duration::from_secs(1));
        legs.track(&code, 0, start);
        legs.track(&code, 2, start);

        let snap = RenderSnapshot::capture(&cycle, Some((&legs, start + Duration::from_millis(1_500))));
        let t = snap.truck("TA01").unwrap();
        assert_eq!((t.x, t.y), (12.0, 8.0));
        assert!(!t.in_motion);
        assert_eq!(t.status, "BROKEN");
    }

    #[test]
    fn corrupted_gauges_read_error() {
        let mut cycle = cycle();
        cycle.trucks[0].faulted = true;
        let snap = RenderSnapshot::capture(&cycle, None);
        let t = snap.truck("TA01").unwrap();
        assert!(t.cargo_pct.is_error());
        assert!(t.fuel_pct.is_error());
        assert_eq!(t.fuel_pct.to_string(), "ERROR");
    }

    #[test]
    fn orders_and_warehouses() {
        let mut cycle = cycle();
        cycle.tick(&mut NoopObserver);
        cycle.tick(&mut NoopObserver);
        let snap = RenderSnapshot::capture(&cycle, None);

        assert_eq!(snap.orders.len(), 1);
        assert_eq!(snap.orders[0].status, "COMPLETED");
        assert!((snap.orders[0].delivered_m3 - 5.0).abs() < 1e-9);

        assert_eq!(snap.warehouses[0].kind, "CENTRAL");
        assert_eq!(snap.warehouses[0].gas_pct, Reading::Percent(25.0));
    }

    #[test]
    fn only_active_blockages_are_shown() {
        let snap = RenderSnapshot::capture(&cycle(), None);
        assert_eq!(snap.blockages.len(), 1);
        assert_eq!(snap.blockages[0].nodes[0], GridPoint::new(20, 20));
    }

    #[test]
    fn snapshot_json_shape() {
        let mut cycle = cycle();
        cycle.trucks[0].faulted = true;
        let snap = RenderSnapshot::capture(&cycle, None);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["stepsRemaining"], 140);
        assert_eq!(json["trucks"][0]["code"], "TA01");
        assert_eq!(json["trucks"][0]["cargoPct"], "ERROR");
        assert_eq!(json["warehouses"][0]["gasPct"], 25.0);
    }

    #[test]
    fn reading_display() {
        assert_eq!(Reading::Percent(42.26).to_string(), "42.3");
        assert_eq!(Reading::from_ratio(Some(0.5), false), Reading::Percent(50.0));
        assert_eq!(Reading::from_ratio(Some(0.5), true), Reading::Error);
        assert_eq!(Reading::from_ratio(None, false), Reading::Error);
        assert_eq!(Reading::Error.percent(), None);
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::*;
    use crate::csv::CsvWriter;
    use crate::writer::OutputWriter;
    use crate::{RenderSnapshot, SnapshotObserver};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    fn rows(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(Result::unwrap).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for f in ["trucks.csv", "orders.csv", "warehouses.csv", "tick_summaries.csv"] {
            assert!(dir.path().join(f).exists(), "{f}");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(headers(&dir, "orders.csv"), [
            "generation", "step", "code", "x", "y", "status", "assigned_m3", "delivered_m3",
        ]);
        assert_eq!(headers(&dir, "trucks.csv")[10], "cargo_pct");
    }

    #[test]
    fn corrupted_gauge_written_as_error() {
        let dir = tmp();
        let mut cycle = cycle();
        cycle.trucks[0].faulted = true;
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_snapshot(&RenderSnapshot::capture(&cycle, None)).unwrap();
        w.finish().unwrap();

        let trucks = rows(&dir, "trucks.csv");
        assert_eq!(trucks.len(), 1);
        assert_eq!(&trucks[0][3], "TA01");
        assert_eq!(&trucks[0][10], "ERROR");
        assert_eq!(&trucks[0][11], "ERROR");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn observer_writes_summaries_and_periodic_snapshots() {
        let dir = tmp();
        let mut cycle = cycle();
        let mut obs = SnapshotObserver::new(CsvWriter::new(dir.path()).unwrap(), 5);
        for _ in 0..10 {
            cycle.tick(&mut obs);
        }
        obs.finish();
        assert!(obs.take_error().is_none());
        assert_eq!(obs.ticks_seen(), 10);

        let summaries = rows(&dir, "tick_summaries.csv");
        assert_eq!(summaries.len(), 10);
        // P1 is delivered on the second step.
        assert_eq!(&summaries[1][6], "5");
        assert_eq!(rows(&dir, "trucks.csv").len(), 2);
        assert_eq!(rows(&dir, "orders.csv").len(), 2);
    }
}

// ── JSON lines ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod jsonl_tests {
    use std::fs;

    use super::*;
    use crate::{JsonLinesWriter, SnapshotObserver};

    #[test]
    fn one_document_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut cycle = cycle();
        let mut obs = SnapshotObserver::new(JsonLinesWriter::new(dir.path()).unwrap(), 2);
        for _ in 0..4 {
            cycle.tick(&mut obs);
        }
        obs.finish();
        assert!(obs.take_error().is_none());

        let snapshots = fs::read_to_string(dir.path().join("snapshots.jsonl")).unwrap();
        let docs: Vec<serde_json::Value> =
            snapshots.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["step"], 4);

        let summaries = fs::read_to_string(dir.path().join("tick_summaries.jsonl")).unwrap();
        assert_eq!(summaries.lines().count(), 4);
    }
}
