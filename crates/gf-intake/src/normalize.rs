//! Wire response → [`Solution`].
//!
//! Normalization never fails.  Every defect degrades to a safe value and is
//! reported through the injected [`DiagnosticSink`]:
//!
//! | Defect                                   | Result                                   |
//! |------------------------------------------|------------------------------------------|
//! | unparseable node                         | `(0,0)` + `MalformedCoordinate`          |
//! | empty route                              | one-node route at the truck + `MalformedRoute` |
//! | tag index outside the route              | tag dropped + `MalformedRoute`           |
//! | gene without a truck record              | Broken truck at the depot + `StructuralViolation` |
//! | duplicate truck code                     | later gene dropped + `StructuralViolation` |
//! | non-finite physical value                | 0 + `NumericCorruption`                  |

use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeDelta};

use gf_core::{
    Diagnostic, DiagnosticKind, DiagnosticSink, GridPoint, OrderCode, TruckCode, WarehouseCode,
    parse_node_lossy, parse_route_lossy,
};
use gf_fleet::{
    Assignment, Blockage, LoadModel, NodeTag, Order, OrderBook, Route, RouteOrder, Solution,
    Truck, TruckStatus, VehicleClass, Warehouse, WarehouseKind, central_depot,
};

use crate::wire::{BlockageDto, GeneDto, OrderDto, SolverResponse, TruckDto, WarehouseDto};

/// Inputs normalization needs besides the response itself.
#[derive(Copy, Clone)]
pub struct NormalizeContext<'a> {
    /// Interval start the solution was requested for; used when the response
    /// omits its own.
    pub requested_start: NaiveDateTime,
    /// Cycle span; used when the response omits `intervalEnd`.
    pub span:            TimeDelta,
    pub load:            LoadModel,
    pub sink:            &'a dyn DiagnosticSink,
}

/// Convert a solver response into a self-contained [`Solution`].
pub fn normalize(response: SolverResponse, cx: &NormalizeContext<'_>) -> Solution {
    let interval_start = response.interval_start.unwrap_or(cx.requested_start);
    let interval_end = response
        .interval_end
        .filter(|end| *end > interval_start)
        .unwrap_or(interval_start + cx.span);
    let simulated_time = response.simulated_time.unwrap_or(interval_start);

    let warehouses: Vec<Warehouse> =
        response.warehouses.iter().map(|w| warehouse(w, cx.sink)).collect();
    let depot = match central_depot(&warehouses) {
        Some(at) => at,
        None => {
            cx.sink.report(Diagnostic::new(
                DiagnosticKind::StructuralViolation,
                "warehouses",
                "solution has no central warehouse; depot assumed at (0,0)",
            ));
            GridPoint::ORIGIN
        }
    };

    let mut orders = OrderBook::new();
    for dto in response.chromosome.iter().flat_map(|g| g.orders.iter()) {
        add_order(&mut orders, dto, cx.sink);
    }
    for dto in &response.unassigned_orders {
        add_order(&mut orders, dto, cx.sink);
    }
    let unassigned = response
        .unassigned_orders
        .iter()
        .map(|o| OrderCode::new(o.code.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let mut assignments = Vec::with_capacity(response.chromosome.len());
    for (i, gene) in response.chromosome.iter().enumerate() {
        let code = gene_code(gene, i);
        if !seen.insert(code.clone()) {
            cx.sink.report(Diagnostic::new(
                DiagnosticKind::StructuralViolation,
                code.as_str(),
                "truck assigned more than one route; later assignment dropped",
            ));
            continue;
        }
        assignments.push(assignment(gene, code, depot, &orders, cx));
    }

    let blockages = response
        .blockages
        .iter()
        .map(|b| blockage(b, interval_start, interval_end, cx.sink))
        .collect();

    tracing::debug!(
        trucks = assignments.len(),
        orders = orders.len(),
        start = %interval_start,
        "normalized solver response"
    );

    Solution {
        assignments,
        orders,
        unassigned,
        warehouses,
        blockages,
        interval_start,
        interval_end,
        simulated_time,
    }
}

// ── Genes ─────────────────────────────────────────────────────────────────────

fn gene_code(gene: &GeneDto, index: usize) -> TruckCode {
    gene.truck
        .as_ref()
        .map(|t| t.code.trim())
        .filter(|c| !c.is_empty())
        .or_else(|| gene.truck_code.as_deref().map(str::trim).filter(|c| !c.is_empty()))
        .map(TruckCode::new)
        .unwrap_or_else(|| TruckCode::new(format!("UNKNOWN-{index}")))
}

fn assignment(
    gene:   &GeneDto,
    code:   TruckCode,
    depot:  GridPoint,
    orders: &OrderBook,
    cx:     &NormalizeContext<'_>,
) -> Assignment {
    let nodes = parse_route_lossy(&gene.route[..], cx.sink);

    let mut truck = match &gene.truck {
        Some(dto) => truck(dto, code.clone(), nodes.first().copied().unwrap_or(depot), cx),
        None => {
            cx.sink.report(Diagnostic::new(
                DiagnosticKind::StructuralViolation,
                code.as_str(),
                "route references a truck absent from the solution; parked broken at the depot",
            ));
            Truck::synthesized(code.clone(), depot)
        }
    };
    truck.progress = 0;

    let route = route(gene, code, nodes, truck.location, orders, cx.sink);
    Assignment { truck, route }
}

fn truck(dto: &TruckDto, code: TruckCode, fallback: GridPoint, cx: &NormalizeContext<'_>) -> Truck {
    let class = dto
        .class
        .as_deref()
        .and_then(|c| c.parse::<VehicleClass>().ok())
        .or_else(|| code.class_prefix().and_then(|p| p.parse().ok()))
        .unwrap_or_else(|| {
            tracing::warn!(truck = %code, "vehicle class unknown, assuming TA");
            VehicleClass::default()
        });
    let location = dto
        .location
        .as_deref()
        .map(|s| parse_node_lossy(s, cx.sink))
        .unwrap_or(fallback);

    let mut t = Truck::new(code, class, location);
    if let Some(raw) = dto.status.as_deref() {
        let status = match raw.parse::<TruckStatus>() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(truck = %t.code, error = %e, "assuming AVAILABLE");
                TruckStatus::Available
            }
        };
        t.status = status;
    }
    if let Some(v) = dto.max_cargo_m3 { t.max_cargo_m3 = v; }
    if let Some(v) = dto.max_fuel_gal { t.max_fuel_gal = v; }
    t.cargo_m3 = dto.cargo_m3.unwrap_or(t.max_cargo_m3);
    t.fuel_gal = dto.fuel_gal.unwrap_or(t.max_fuel_gal);
    if let Some(v) = dto.tare_t { t.tare_t = v; }
    if let Some(v) = dto.speed_kmh { t.speed_kmh = v; }

    if t.refresh_derived(cx.load) {
        cx.sink.report(Diagnostic::new(
            DiagnosticKind::NumericCorruption,
            t.code.as_str(),
            "non-finite physical value in truck record; clamped to 0",
        ));
    }
    t
}

fn route(
    gene:   &GeneDto,
    code:   TruckCode,
    nodes:  Vec<GridPoint>,
    parked: GridPoint,
    orders: &OrderBook,
    sink:   &dyn DiagnosticSink,
) -> Route {
    if nodes.is_empty() {
        sink.report(Diagnostic::new(
            DiagnosticKind::MalformedRoute,
            code.as_str(),
            "empty route; truck held in place",
        ));
        return Route::stationary(code, parked);
    }

    let destination = gene
        .destination
        .as_deref()
        .map(|s| parse_node_lossy(s, sink))
        .unwrap_or(nodes[nodes.len() - 1]);

    let route_orders = gene
        .orders
        .iter()
        .map(|o| {
            let code = OrderCode::new(o.code.as_str());
            let remaining = orders.get(&code).map_or(0.0, Order::remaining);
            RouteOrder {
                location:  parse_node_lossy(&o.location, sink),
                volume_m3: finite(o.volume_m3.unwrap_or(remaining), code.as_str(), "volumeM3", sink),
                code,
            }
        })
        .collect();

    let mut tags = Vec::new();
    if !gene.tags.is_empty() {
        tags = vec![NodeTag::None; nodes.len()];
        for tag in &gene.tags {
            let Some(severity) = tag.breakdown else { continue };
            match tags.get_mut(tag.index) {
                Some(slot) => *slot = NodeTag::BreakdownTrigger { severity },
                None => sink.report(Diagnostic::new(
                    DiagnosticKind::MalformedRoute,
                    code.as_str(),
                    format!("tag index {} outside a {}-node route; dropped", tag.index, nodes.len()),
                )),
            }
        }
    }

    match Route::new(code.clone(), nodes, destination, route_orders, tags) {
        Ok(route) => route,
        Err(e) => {
            sink.report(Diagnostic::new(DiagnosticKind::MalformedRoute, code.as_str(), e.to_string()));
            Route::stationary(code, parked)
        }
    }
}

// ── Orders, warehouses, blockages ─────────────────────────────────────────────

/// First occurrence of an order code wins.
fn add_order(book: &mut OrderBook, dto: &OrderDto, sink: &dyn DiagnosticSink) {
    let code = OrderCode::new(dto.code.as_str());
    if book.get(&code).is_some() {
        return;
    }
    let assigned = finite(dto.assigned_m3, code.as_str(), "assignedM3", sink);
    let mut order = Order::new(code, parse_node_lossy(&dto.location, sink), assigned);
    order.delivered_m3 =
        finite(dto.delivered_m3, order.code.as_str(), "deliveredM3", sink).min(assigned);
    order.deadline = dto.deadline;
    book.insert(order);
}

fn warehouse(dto: &WarehouseDto, sink: &dyn DiagnosticSink) -> Warehouse {
    let kind = match dto.kind.trim().to_ascii_uppercase().as_str() {
        "CENTRAL" | "PRINCIPAL" | "MAIN" => WarehouseKind::Central,
        _ => WarehouseKind::Secondary,
    };
    let subject = dto.code.as_str();
    let max_gas_m3 = finite(dto.max_gas_m3.unwrap_or(0.0), subject, "maxGasM3", sink);
    let max_fuel_gal = finite(dto.max_fuel_gal.unwrap_or(0.0), subject, "maxFuelGal", sink);
    Warehouse {
        code:     WarehouseCode::new(subject),
        kind,
        location: parse_node_lossy(&dto.location, sink),
        gas_m3:   finite(dto.gas_m3.unwrap_or(max_gas_m3), subject, "gasM3", sink),
        max_gas_m3,
        fuel_gal: finite(dto.fuel_gal.unwrap_or(max_fuel_gal), subject, "fuelGal", sink),
        max_fuel_gal,
    }
}

fn blockage(
    dto:            &BlockageDto,
    interval_start: NaiveDateTime,
    interval_end:   NaiveDateTime,
    sink:           &dyn DiagnosticSink,
) -> Blockage {
    Blockage {
        nodes: parse_route_lossy(&dto.nodes[..], sink),
        start: dto.start.unwrap_or(interval_start),
        end:   dto.end.unwrap_or(interval_end),
    }
}

/// `value` if finite and non-negative, else 0 with a diagnostic.
fn finite(value: f64, subject: &str, field: &str, sink: &dyn DiagnosticSink) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        sink.report(Diagnostic::new(
            DiagnosticKind::NumericCorruption,
            subject,
            format!("{field} = {value}; clamped to 0"),
        ));
        0.0
    }
}
