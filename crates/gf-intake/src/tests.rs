//! Unit tests for gf-intake.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use gf_core::{CollectingSink, DiagnosticKind, GridPoint, TruckCode};
use gf_fleet::LoadModel;

use crate::wire::{GeneDto, OrderDto, SolverResponse, TagDto, TruckDto, WarehouseDto};
use crate::{Intake, NormalizeContext, ScriptedSource};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn central() -> WarehouseDto {
    WarehouseDto {
        code:         "CENTRAL".into(),
        kind:         "CENTRAL".into(),
        location:     "(12,8)".into(),
        max_gas_m3:   Some(1_000.0),
        max_fuel_gal: Some(1_000.0),
        ..WarehouseDto::default()
    }
}

fn gene(code: &str, route: &[&str]) -> GeneDto {
    GeneDto {
        truck: Some(TruckDto { code: code.into(), ..TruckDto::default() }),
        route: route.iter().map(|s| s.to_string()).collect(),
        ..GeneDto::default()
    }
}

fn response() -> SolverResponse {
    let mut g = gene("TA01", &["(12,8)", "(13,8)", "(14,8)"]);
    g.orders.push(OrderDto {
        code:        "P1".into(),
        location:    "(14,8)".into(),
        assigned_m3: 5.0,
        ..OrderDto::default()
    });
    SolverResponse {
        chromosome:     vec![g],
        warehouses:     vec![central()],
        interval_start: Some(t0()),
        ..SolverResponse::default()
    }
}

fn cx(sink: &CollectingSink) -> NormalizeContext<'_> {
    NormalizeContext {
        requested_start: t0(),
        span:            TimeDelta::hours(2),
        load:            LoadModel::default(),
        sink,
    }
}

fn intake(source: Arc<ScriptedSource>, sink: Arc<CollectingSink>) -> Intake {
    Intake::new(source, sink, TimeDelta::hours(2), LoadModel::default())
}

// ── Normalization ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod normalize {
    use super::*;
    use gf_core::OrderCode;
    use gf_fleet::{NodeTag, TruckStatus, VehicleClass};

    use crate::normalize;

    #[test]
    fn well_formed_response() {
        let sink = CollectingSink::new();
        let s = normalize(response(), &cx(&sink));

        assert!(s.is_structurally_valid());
        assert_eq!(s.interval_end, t0() + TimeDelta::hours(2));
        let a = &s.assignments[0];
        assert_eq!(a.truck.class, VehicleClass::TA);
        assert_eq!(a.truck.location, GridPoint::new(12, 8));
        assert_eq!(a.route.len(), 3);
        assert_eq!(a.route.destination, GridPoint::new(14, 8));
        assert_eq!(a.route.orders[0].volume_m3, 5.0);
        assert_eq!(s.orders.get(&OrderCode::new("P1")).unwrap().assigned_m3, 5.0);
        assert!(sink.is_empty(), "{:?}", sink.take());
    }

    #[test]
    fn decodes_camel_case_json() {
        let body = br#"{
            "chromosome": [{
                "truck": { "code": "TB03", "type": "TB", "fuelGal": 12.5, "status": "EN_RUTA" },
                "nodes": ["(1,1)", "(1,2)"],
                "tags": [{ "index": 1, "breakdown": 3 }]
            }],
            "warehouses": [{ "code": "C", "kind": "CENTRAL", "location": "(0,0)" }],
            "intervalStart": "2025-01-01T02:00:00"
        }"#;
        let r = SolverResponse::from_json(body).unwrap();
        let sink = CollectingSink::new();
        let s = normalize(r, &cx(&sink));

        let a = &s.assignments[0];
        assert_eq!(s.interval_start, t0() + TimeDelta::hours(2));
        assert_eq!(a.truck.class, VehicleClass::TB);
        assert_eq!(a.truck.fuel_gal, 12.5);
        assert_eq!(a.truck.status, TruckStatus::EnRoute);
        assert_eq!(a.route.tag(1), NodeTag::BreakdownTrigger { severity: 3 });
    }

    #[test]
    fn missing_truck_is_synthesized_at_the_depot() {
        let mut r = response();
        r.chromosome.push(GeneDto {
            truck_code: Some("TC07".into()),
            route: vec!["(1,1)".into(), "(2,1)".into()],
            ..GeneDto::default()
        });
        let sink = CollectingSink::new();
        let s = normalize(r, &cx(&sink));

        let ghost = &s.assignments[1].truck;
        assert_eq!(ghost.code, TruckCode::new("TC07"));
        assert_eq!(ghost.status, TruckStatus::Broken);
        assert_eq!(ghost.location, GridPoint::new(12, 8));
        assert_eq!(sink.count(DiagnosticKind::StructuralViolation), 1);
    }

    #[test]
    fn malformed_data_degrades_per_record() {
        let mut r = response();
        r.chromosome.push(gene("TA02", &[]));
        let mut bad = gene("TA03", &["(5,5)", "garbage"]);
        bad.tags.push(TagDto { index: 9, breakdown: Some(1) });
        r.chromosome.push(bad);
        r.chromosome.push(gene("TA01", &["(0,0)"]));

        let sink = CollectingSink::new();
        let s = normalize(r, &cx(&sink));

        assert_eq!(s.assignments.len(), 3, "duplicate TA01 dropped");
        let empty = &s.assignments[1];
        assert!(empty.route.is_degenerate());
        let garbled = &s.assignments[2];
        assert_eq!(garbled.route.node(1), Some(GridPoint::ORIGIN));
        assert_eq!(garbled.route.tag(9), NodeTag::None);

        assert_eq!(sink.count(DiagnosticKind::MalformedCoordinate), 1);
        assert_eq!(sink.count(DiagnosticKind::MalformedRoute), 2);
        assert_eq!(sink.count(DiagnosticKind::StructuralViolation), 1);
    }

    #[test]
    fn routeless_response_is_not_ready() {
        let r = SolverResponse { warehouses: vec![central()], ..SolverResponse::default() };
        let sink = CollectingSink::new();
        assert!(!normalize(r, &cx(&sink)).is_structurally_valid());
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sources {
    use super::*;
    use crate::{JsonDirSource, SolutionSource};

    #[tokio::test]
    async fn json_dir_reads_dump_by_interval_start() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirSource::new(dir.path());
        let path = source.path_for(t0());
        assert!(path.ends_with("2025-01-01T00-00-00.json"));

        assert!(source.fetch(t0()).await.unwrap().is_none());
        std::fs::write(&path, serde_json::to_vec(&response()).unwrap()).unwrap();
        let r = source.fetch(t0()).await.unwrap().unwrap();
        assert_eq!(r.chromosome.len(), 1);
    }

    #[tokio::test]
    async fn json_dir_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirSource::new(dir.path());
        std::fs::write(source.path_for(t0()), b"{ not json").unwrap();
        assert!(matches!(source.fetch(t0()).await, Err(crate::IntakeError::Decode(_))));
    }

    #[tokio::test]
    async fn json_dir_appends_breakdowns() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirSource::new(dir.path());
        source.report_breakdown(&TruckCode::new("TA01"), 2, t0()).await.unwrap();
        source.report_breakdown(&TruckCode::new("TB02"), 1, t0()).await.unwrap();
        let log = std::fs::read_to_string(dir.path().join("breakdowns.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.contains("\"TA01\""));
    }

    #[tokio::test]
    async fn intake_filters_routeless_solutions() {
        let source = Arc::new(ScriptedSource::new());
        source.push(crate::Scripted::Ready(SolverResponse::default()));
        source.push(crate::Scripted::Ready(response()));
        let i = intake(source.clone(), Arc::new(CollectingSink::new()));

        assert!(i.fetch(t0()).await.unwrap().is_none());
        assert!(i.fetch(t0()).await.unwrap().is_some());
        assert_eq!(source.requests().len(), 2);
    }
}

// ── Startup poll ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod poll {
    use std::time::Duration;

    use super::*;
    use crate::{IntakeError, Scripted, poll_first_solution};

    #[tokio::test(start_paused = true)]
    async fn retries_until_valid() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Scripted::NotReady);
        source.push(Scripted::Fail("connection refused".into()));
        source.push(Scripted::Ready(response()));
        let sink = Arc::new(CollectingSink::new());
        let i = intake(source.clone(), sink.clone());

        let started = tokio::time::Instant::now();
        let s = poll_first_solution(&i, t0(), Duration::from_secs(2), 60).await.unwrap();
        assert_eq!(s.assignments.len(), 1);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5));
        assert_eq!(sink.count(DiagnosticKind::FetchFailure), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_budget() {
        let source = Arc::new(ScriptedSource::new());
        let i = intake(source.clone(), Arc::new(CollectingSink::new()));

        let err = poll_first_solution(&i, t0(), Duration::from_secs(2), 5).await.unwrap_err();
        assert!(matches!(err, IntakeError::NotAvailable { attempts: 5 }));
        assert_eq!(source.requests().len(), 5);
    }
}

// ── Prefetch ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod prefetch {
    use std::time::Duration;

    use super::*;
    use crate::{FetchPurpose, Prefetcher, Scripted, TaskHandle};

    fn slow_source() -> Arc<ScriptedSource> {
        Arc::new(ScriptedSource::new().with_latency(Duration::from_secs(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn result_is_taken_once_ready() {
        let source = slow_source();
        source.push(Scripted::Ready(response()));
        let mut p = Prefetcher::new(intake(source, Arc::new(CollectingSink::new())));

        assert!(p.request(FetchPurpose::NextCycle, 0, t0()));
        assert!(!p.request(FetchPurpose::NextCycle, 0, t0()), "duplicate request ignored");
        assert!(p.try_take(0).is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let got = p.try_take(0).unwrap();
        assert_eq!(got.purpose, FetchPurpose::NextCycle);
        assert_eq!(got.solution.assignments.len(), 1);
        assert!(!p.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_discarded() {
        let source = slow_source();
        source.push(Scripted::Ready(response()));
        let mut p = Prefetcher::new(intake(source, Arc::new(CollectingSink::new())));

        p.request(FetchPurpose::NextCycle, 3, t0());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(p.try_take(4).is_none());
        assert!(!p.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_blocks_until_arrival() {
        let source = slow_source();
        source.push(Scripted::Ready(response()));
        let mut p = Prefetcher::new(intake(source, Arc::new(CollectingSink::new())));

        p.request(FetchPurpose::Replan, 1, t0());
        let got = p.wait(1).await.unwrap();
        assert_eq!(got.purpose, FetchPurpose::Replan);
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_replan_is_reissued() {
        let source = slow_source();
        source.push(Scripted::Ready(response()));
        let mut p = Prefetcher::new(intake(source, Arc::new(CollectingSink::new())));

        p.request(FetchPurpose::Replan, 2, t0());
        assert!(p.suspend());
        assert!(!p.is_pending());

        assert_eq!(p.resume(2), Some(FetchPurpose::Replan));
        assert_eq!(p.pending_purpose(), Some(FetchPurpose::Replan));
        let got = p.wait(2).await.unwrap();
        assert_eq!(got.purpose, FetchPurpose::Replan);
        assert_eq!(p.resume(2), None, "resumed once");
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_fetch_of_old_generation_is_dropped() {
        let source = slow_source();
        let mut p = Prefetcher::new(intake(source, Arc::new(CollectingSink::new())));

        p.request(FetchPurpose::NextCycle, 2, t0());
        p.suspend();
        assert_eq!(p.resume(3), None);
        assert!(!p.is_pending());

        p.request(FetchPurpose::NextCycle, 3, t0());
        p.suspend();
        p.cancel();
        assert_eq!(p.resume(3), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let source = slow_source();
        let mut p = Prefetcher::new(intake(source.clone(), Arc::new(CollectingSink::new())));

        p.request(FetchPurpose::NextCycle, 0, t0());
        assert!(p.cancel());
        assert!(!p.cancel());
        assert!(p.try_take(0).is_none());

        let mut h = TaskHandle::spawn("sleeper", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert!(h.is_running());
        assert!(h.cancel());
        assert!(!h.cancel());
        assert!(!h.is_running());
    }
}
