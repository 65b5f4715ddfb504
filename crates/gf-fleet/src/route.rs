//! Per-truck routes for one cycle.

use gf_core::{GridPoint, OrderCode, TruckCode};

use crate::{FleetError, FleetResult};

/// Semantic tag attached to one route node.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeTag {
    #[default]
    None,
    /// Reaching this node triggers a scripted breakdown of the given severity
    /// (1 = minor, 2 = moderate, 3 = severe).
    BreakdownTrigger { severity: u8 },
}

/// A delivery the route is entitled to make.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteOrder {
    pub code:      OrderCode,
    pub location:  GridPoint,
    /// Volume assigned to this route, m³.
    pub volume_m3: f64,
}

/// An immutable node sequence assigned to one truck for one cycle.
///
/// Always holds at least one node.  `tags`, when non-empty, is aligned by
/// index with `nodes`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub truck:       TruckCode,
    nodes:           Vec<GridPoint>,
    pub destination: GridPoint,
    pub orders:      Vec<RouteOrder>,
    tags:            Vec<NodeTag>,
}

impl Route {
    /// Build a route.
    ///
    /// # Errors
    ///
    /// `EmptyRoute` if `nodes` is empty; `TagLengthMismatch` if `tags` is
    /// non-empty and not the same length as `nodes`.
    pub fn new(
        truck:       TruckCode,
        nodes:       Vec<GridPoint>,
        destination: GridPoint,
        orders:      Vec<RouteOrder>,
        tags:        Vec<NodeTag>,
    ) -> FleetResult<Self> {
        if nodes.is_empty() {
            return Err(FleetError::EmptyRoute(truck));
        }
        if !tags.is_empty() && tags.len() != nodes.len() {
            return Err(FleetError::TagLengthMismatch {
                truck,
                nodes: nodes.len(),
                tags:  tags.len(),
            });
        }
        Ok(Self { truck, nodes, destination, orders, tags })
    }

    /// A one-node route that keeps the truck at `at`.
    pub fn stationary(truck: TruckCode, at: GridPoint) -> Self {
        Self {
            truck,
            nodes:       vec![at],
            destination: at,
            orders:      Vec::new(),
            tags:        Vec::new(),
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[GridPoint] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` for a single-node route.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.nodes.len() == 1
    }

    #[inline]
    pub fn node(&self, index: usize) -> Option<GridPoint> {
        self.nodes.get(index).copied()
    }

    #[inline]
    pub fn last(&self) -> GridPoint {
        self.nodes[self.nodes.len() - 1]
    }

    /// Tag at `index`, `NodeTag::None` when untagged.
    pub fn tag(&self, index: usize) -> NodeTag {
        self.tags.get(index).copied().unwrap_or_default()
    }

    /// Route orders targeting `node`.
    pub fn orders_at(&self, node: GridPoint) -> impl Iterator<Item = &RouteOrder> {
        self.orders.iter().filter(move |o| o.location == node)
    }

    /// Display-only estimate of how much of `capacity_m3` each order on this
    /// route would receive if split evenly.  Never used to mutate deliveries.
    pub fn estimated_share_per_order(&self, capacity_m3: f64) -> f64 {
        if self.orders.is_empty() || !capacity_m3.is_finite() {
            return 0.0;
        }
        capacity_m3.max(0.0) / self.orders.len() as f64
    }
}
