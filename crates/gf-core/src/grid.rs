//! Integer grid coordinates and the `"(x,y)"` node codec.
//!
//! The solver exchanges route nodes as text.  Two parsers are provided:
//!
//! - [`GridPoint::from_str`] is strict and returns a [`CoreError`].
//! - [`parse_node_lossy`] never fails: malformed input becomes `(0,0)` and a
//!   [`Diagnostic`] is reported so the corruption stays observable.
//!
//! Grid steps are unit length, so equality is exact integer equality.

use std::fmt;
use std::str::FromStr;

use crate::diag::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::CoreError;

/// A node on the city grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    /// The fallback coordinate for unparseable nodes.
    pub const ORIGIN: GridPoint = GridPoint { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid (L1) distance in unit steps.
    #[inline]
    pub fn manhattan(self, other: GridPoint) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl FromStr for GridPoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CoreError::Coordinate {
            text:   s.to_owned(),
            reason: reason.to_owned(),
        };

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| malformed("expected parentheses around \"x,y\""))?;

        let (x, y) = inner
            .split_once(',')
            .ok_or_else(|| malformed("expected a comma between components"))?;

        let x = x.trim().parse::<i32>().map_err(|_| malformed("x is not an integer"))?;
        let y = y.trim().parse::<i32>().map_err(|_| malformed("y is not an integer"))?;
        Ok(GridPoint { x, y })
    }
}

// ── Lossy codec ───────────────────────────────────────────────────────────────

/// Parse a node, falling back to [`GridPoint::ORIGIN`] on malformed input.
///
/// The failure is reported to `sink` as [`DiagnosticKind::MalformedCoordinate`];
/// this function never panics and never returns an error.
pub fn parse_node_lossy(text: &str, sink: &dyn DiagnosticSink) -> GridPoint {
    match text.parse::<GridPoint>() {
        Ok(p) => p,
        Err(e) => {
            sink.report(Diagnostic::new(
                DiagnosticKind::MalformedCoordinate,
                text,
                e.to_string(),
            ));
            GridPoint::ORIGIN
        }
    }
}

/// Parse every node of a route with [`parse_node_lossy`].
pub fn parse_route_lossy<S: AsRef<str>>(nodes: &[S], sink: &dyn DiagnosticSink) -> Vec<GridPoint> {
    nodes.iter().map(|n| parse_node_lossy(n.as_ref(), sink)).collect()
}

/// Inverse of [`parse_route_lossy`] for well-formed routes.
pub fn format_route(nodes: &[GridPoint]) -> Vec<String> {
    nodes.iter().map(GridPoint::to_string).collect()
}
