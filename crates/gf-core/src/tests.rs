//! Unit tests for gf-core primitives.

#[cfg(test)]
mod ids {
    use crate::{OrderCode, TruckCode};

    #[test]
    fn display_is_raw_code() {
        assert_eq!(TruckCode::new("TA01").to_string(), "TA01");
        assert_eq!(OrderCode::from("PED-7").as_str(), "PED-7");
    }

    #[test]
    fn class_prefix() {
        assert_eq!(TruckCode::new("TB03").class_prefix(), Some("TB"));
        assert_eq!(TruckCode::new("7").class_prefix(), None);
        assert_eq!(TruckCode::new("1A22").class_prefix(), None);
    }
}

#[cfg(test)]
mod grid {
    use crate::{
        CollectingSink, DiagnosticKind, GridPoint, format_route, parse_node_lossy,
        parse_route_lossy,
    };

    #[test]
    fn parses_well_formed_node() {
        assert_eq!("(3,4)".parse::<GridPoint>().unwrap(), GridPoint::new(3, 4));
        assert_eq!(" ( -2 , 15 ) ".parse::<GridPoint>().unwrap(), GridPoint::new(-2, 15));
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        assert!("garbage".parse::<GridPoint>().is_err());
        assert!("(3;4)".parse::<GridPoint>().is_err());
        assert!("(3,x)".parse::<GridPoint>().is_err());
        assert!("3,4".parse::<GridPoint>().is_err());
    }

    #[test]
    fn lossy_parse_falls_back_and_reports() {
        let sink = CollectingSink::new();
        assert_eq!(parse_node_lossy("(3,4)", &sink), GridPoint::new(3, 4));
        assert!(sink.is_empty());

        assert_eq!(parse_node_lossy("garbage", &sink), GridPoint::ORIGIN);
        let diags = sink.take();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MalformedCoordinate);
        assert_eq!(diags[0].subject, "garbage");
    }

    #[test]
    fn route_codec_round_trips() {
        let sink = CollectingSink::new();
        let route = parse_route_lossy(&["(8,12)", "(9,12)", "(10,12)"], &sink);
        assert_eq!(route, vec![GridPoint::new(8, 12), GridPoint::new(9, 12), GridPoint::new(10, 12)]);
        assert_eq!(format_route(&route), vec!["(8,12)", "(9,12)", "(10,12)"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn bad_node_inside_route_only_degrades_that_node() {
        let sink = CollectingSink::new();
        let route = parse_route_lossy(&["(1,1)", "(a,b)", "(1,3)"], &sink);
        assert_eq!(route[1], GridPoint::ORIGIN);
        assert_eq!(route[2], GridPoint::new(1, 3));
        assert_eq!(sink.count(DiagnosticKind::MalformedCoordinate), 1);
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(GridPoint::new(0, 0).manhattan(GridPoint::new(3, -4)), 7);
    }
}

#[cfg(test)]
mod time {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    use crate::{CycleClock, Step, crosses_midnight};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn step_times_do_not_drift() {
        let clock = CycleClock::new(at(0, 0, 0), TimeDelta::hours(2), 140);
        assert_eq!(clock.time_at(Step(0)), at(0, 0, 0));
        assert_eq!(clock.time_at(Step(70)), at(1, 0, 0));
        assert_eq!(clock.time_at(Step(140)), at(2, 0, 0));
        assert_eq!(clock.next_cycle_start(), at(2, 0, 0));
    }

    #[test]
    fn advance_and_restart() {
        let mut clock = CycleClock::new(at(8, 0, 0), TimeDelta::hours(2), 4);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), at(9, 0, 0));
        clock.restart_at(at(10, 0, 0));
        assert_eq!(clock.step, Step::ZERO);
        assert_eq!(clock.now(), at(10, 0, 0));
    }

    #[test]
    fn midnight_detection() {
        let late = at(23, 59, 0);
        let next_day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(crosses_midnight(late, next_day));
        assert!(!crosses_midnight(at(10, 0, 0), at(11, 0, 0)));
        // Leaving midnight is not a second crossing.
        assert!(!crosses_midnight(next_day, next_day + TimeDelta::minutes(1)));
    }
}

#[cfg(test)]
mod config {
    use crate::EngineConfig;

    #[test]
    fn defaults_validate() {
        let cfg = EngineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.prefetch_threshold(), 14);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = EngineConfig { steps_per_cycle: 0, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig { prefetch_fraction: 1.5, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig { reference_speed: f64::NAN, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn threshold_must_leave_a_step() {
        let cfg = EngineConfig { steps_per_cycle: 1, prefetch_fraction: 0.6, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.prefetch_threshold(), 0);

        let cfg = EngineConfig { steps_per_cycle: 2, prefetch_fraction: 0.75, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.prefetch_threshold(), 1);

        let cfg = EngineConfig { steps_per_cycle: 2, prefetch_fraction: 0.5, ..EngineConfig::default() };
        cfg.validate().unwrap();
        assert_eq!(cfg.prefetch_threshold(), 1);
    }
}
