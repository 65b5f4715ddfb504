//! Seeded stand-in for the routing solver.
//!
//! Every interval gets a fresh plan: each truck leaves the depot, drives a
//! Manhattan path through one or two customers and heads back.  A plan is a
//! pure function of the seed and the interval start, so fetching the same
//! interval twice yields the same response.

use chrono::{NaiveDateTime, TimeDelta};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use gf_core::{GridPoint, format_route};
use gf_intake::{BlockageDto, GeneDto, OrderDto, SolverResponse, TagDto, TruckDto, WarehouseDto};

// ── Constants ─────────────────────────────────────────────────────────────────

const GRID_W: i32 = 70;
const GRID_H: i32 = 50;

const DEPOT: GridPoint = GridPoint { x: 12, y: 8 };

/// Manhattan radius for customers; two stops and the way back fit in 120
/// nodes.
const REACH: i32 = 30;

const FLEET: &[(&str, &str)] = &[
    ("TA01", "TA"),
    ("TA02", "TA"),
    ("TB01", "TB"),
    ("TB02", "TB"),
    ("TC01", "TC"),
    ("TD01", "TD"),
];

const SECONDARY: &[(&str, GridPoint)] = &[
    ("NORTE", GridPoint { x: 42, y: 42 }),
    ("ESTE", GridPoint { x: 63, y: 3 }),
];

/// Chance that a route carries a scripted breakdown.
const BREAKDOWN_CHANCE: f64 = 0.05;

// ── Scenario ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
pub struct Scenario {
    seed:      u64,
    max_nodes: usize,
    span:      TimeDelta,
}

impl Scenario {
    /// Routes are cut to `steps_per_cycle + 1` nodes so each fits one cycle.
    pub fn new(seed: u64, steps_per_cycle: u32, span: TimeDelta) -> Self {
        Self { seed, max_nodes: steps_per_cycle as usize + 1, span }
    }

    pub fn response(&self, interval_start: NaiveDateTime) -> SolverResponse {
        let stamp = interval_start.and_utc().timestamp() as u64;
        let mut rng = SmallRng::seed_from_u64(self.seed ^ stamp.rotate_left(17));

        let chromosome = FLEET
            .iter()
            .enumerate()
            .map(|(i, (code, class))| self.gene(&mut rng, interval_start, i, code, class))
            .collect();

        SolverResponse {
            chromosome,
            unassigned_orders: Vec::new(),
            blockages: vec![blockage(&mut rng, interval_start, self.span)],
            warehouses: warehouses(),
            interval_start: Some(interval_start),
            interval_end: Some(interval_start + self.span),
            simulated_time: Some(interval_start),
        }
    }

    fn gene(
        &self,
        rng:   &mut SmallRng,
        start: NaiveDateTime,
        index: usize,
        code:  &str,
        class: &str,
    ) -> GeneDto {
        let count = rng.gen_range(1..=2);
        let stops: Vec<GridPoint> = (0..count).map(|_| random_node(rng)).collect();

        let mut nodes = vec![DEPOT];
        let mut cursor = DEPOT;
        for &stop in stops.iter().chain(std::iter::once(&DEPOT)) {
            walk(&mut nodes, cursor, stop);
            cursor = stop;
        }
        nodes.truncate(self.max_nodes);

        let deadline = start + self.span * 2;
        let orders = stops
            .iter()
            .enumerate()
            .filter(|(_, stop)| nodes.contains(stop))
            .map(|(k, stop)| {
                let volume = f64::from(rng.gen_range(2u8..=10));
                OrderDto {
                    code: format!("P{}-{index}{k}", start.format("%d%H%M")),
                    location: stop.to_string(),
                    assigned_m3: volume,
                    delivered_m3: 0.0,
                    deadline: Some(deadline),
                    volume_m3: Some(volume),
                }
            })
            .collect();

        let tags = if nodes.len() > 2 && rng.gen_bool(BREAKDOWN_CHANCE) {
            vec![TagDto {
                index:     rng.gen_range(1..nodes.len()),
                breakdown: Some(rng.gen_range(1..=3)),
            }]
        } else {
            Vec::new()
        };

        let destination = nodes.last().copied().unwrap_or(DEPOT);
        GeneDto {
            truck: Some(TruckDto {
                code: code.to_owned(),
                class: Some(class.to_owned()),
                location: Some(DEPOT.to_string()),
                ..TruckDto::default()
            }),
            truck_code: None,
            route: format_route(&nodes),
            destination: Some(destination.to_string()),
            orders,
            tags,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A customer within `REACH` of the depot, on the map.
fn random_node(rng: &mut SmallRng) -> GridPoint {
    let dx = rng.gen_range(-REACH..=REACH);
    let dy_max = REACH - dx.abs();
    let dy = rng.gen_range(-dy_max..=dy_max);
    GridPoint::new((DEPOT.x + dx).clamp(0, GRID_W), (DEPOT.y + dy).clamp(0, GRID_H))
}

/// Append the nodes from `from` (exclusive) to `to`, x first.
fn walk(nodes: &mut Vec<GridPoint>, from: GridPoint, to: GridPoint) {
    let mut p = from;
    while p.x != to.x {
        p.x += (to.x - p.x).signum();
        nodes.push(p);
    }
    while p.y != to.y {
        p.y += (to.y - p.y).signum();
        nodes.push(p);
    }
}

fn blockage(rng: &mut SmallRng, start: NaiveDateTime, span: TimeDelta) -> BlockageDto {
    let y = rng.gen_range(0..=GRID_H);
    let x0 = rng.gen_range(0..GRID_W - 5);
    BlockageDto {
        nodes: vec![GridPoint::new(x0, y).to_string(), GridPoint::new(x0 + 5, y).to_string()],
        start: Some(start),
        end:   Some(start + span / 2),
    }
}

fn warehouses() -> Vec<WarehouseDto> {
    let central = WarehouseDto {
        code:     "CENTRAL".into(),
        kind:     "CENTRAL".into(),
        location: DEPOT.to_string(),
        ..WarehouseDto::default()
    };
    std::iter::once(central)
        .chain(SECONDARY.iter().map(|(code, at)| WarehouseDto {
            code:         (*code).into(),
            kind:         "SECONDARY".into(),
            location:     at.to_string(),
            gas_m3:       Some(160.0),
            max_gas_m3:   Some(160.0),
            fuel_gal:     None,
            max_fuel_gal: None,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn same_interval_same_plan() {
        let s = Scenario::new(7, 140, TimeDelta::hours(2));
        assert_eq!(s.response(t0()), s.response(t0()));
    }

    #[test]
    fn routes_are_round_trips_within_budget() {
        let s = Scenario::new(7, 140, TimeDelta::hours(2));
        let r = s.response(t0());
        assert_eq!(r.chromosome.len(), FLEET.len());
        for gene in &r.chromosome {
            assert!(gene.route.len() <= 141);
            assert_eq!(gene.route[0], DEPOT.to_string());
        }
        assert_eq!(r.interval_end, Some(t0() + TimeDelta::hours(2)));
    }

    #[test]
    fn walk_is_unit_steps() {
        let mut nodes = vec![GridPoint::new(0, 0)];
        walk(&mut nodes, GridPoint::new(0, 0), GridPoint::new(2, -1));
        assert_eq!(nodes, [
            GridPoint::new(0, 0),
            GridPoint::new(1, 0),
            GridPoint::new(2, 0),
            GridPoint::new(2, -1),
        ]);
    }
}
