//! Continuous position interpolation for rendering.
//!
//! Maps wall-clock time elapsed since a truck's leg began onto a fractional
//! position along the nodes of that leg:
//!
//! ```text
//! elapsed   = now - leg_start
//! index     = floor(elapsed / per_node)
//! progress  = (elapsed mod per_node) / per_node
//! position  = lerp(nodes[index], nodes[index + 1], progress)
//! heading   = atan2(dy, dx)  in degrees
//! ```
//!
//! Once `index >= len - 1` the pose is pinned to the last node and marked
//! not-in-motion.  Everything here is a pure function of its inputs: the
//! simulation state is neither read nor written.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gf_core::{GridPoint, TruckCode};

/// Rendered position of one truck.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    pub x:           f64,
    pub y:           f64,
    /// Degrees, `atan2(dy, dx)`; 0 = +x, 90 = +y.
    pub heading_deg: f64,
    /// Index of the node the current segment starts from.
    pub node_index:  usize,
    /// Fraction of the current segment covered, in `[0, 1)`.
    pub progress:    f64,
    pub in_motion:   bool,
}

impl Pose {
    /// A stationary pose on `node`.
    pub fn parked(node: GridPoint, node_index: usize) -> Self {
        Self {
            x:           node.x as f64,
            y:           node.y as f64,
            heading_deg: 0.0,
            node_index,
            progress:    0.0,
            in_motion:   false,
        }
    }
}

/// Pose `elapsed` into a leg over `nodes`, at `per_node` per segment.
///
/// An empty node list yields a parked pose at the origin; a zero `per_node`
/// means the leg completes instantly.
pub fn pose_at(nodes: &[GridPoint], elapsed: Duration, per_node: Duration) -> Pose {
    let Some(&last) = nodes.last() else {
        return Pose::parked(GridPoint::ORIGIN, 0);
    };
    let last_index = nodes.len() - 1;
    if per_node.is_zero() || last_index == 0 {
        return Pose::parked(last, last_index);
    }

    let per_ns = per_node.as_nanos();
    let elapsed_ns = elapsed.as_nanos();
    let index = elapsed_ns / per_ns;
    if index >= last_index as u128 {
        return Pose::parked(last, last_index);
    }
    let index = index as usize;
    let progress = (elapsed_ns % per_ns) as f64 / per_ns as f64;

    let from = nodes[index];
    let to = nodes[index + 1];
    let (dx, dy) = ((to.x - from.x) as f64, (to.y - from.y) as f64);

    Pose {
        x:           from.x as f64 + dx * progress,
        y:           from.y as f64 + dy * progress,
        heading_deg: dy.atan2(dx).to_degrees(),
        node_index:  index,
        progress,
        in_motion:   true,
    }
}

/// [`pose_at`] with the elapsed time taken from two instants.  A `now`
/// earlier than `leg_start` counts as zero elapsed.
#[inline]
pub fn pose_between(nodes: &[GridPoint], leg_start: Instant, now: Instant, per_node: Duration) -> Pose {
    pose_at(nodes, now.saturating_duration_since(leg_start), per_node)
}

// ── LegClocks ─────────────────────────────────────────────────────────────────

/// One rendered segment: from route index `from` to `to`, begun at `start`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Leg {
    from:  usize,
    to:    usize,
    start: Instant,
}

/// Per-truck render legs, anchored to simulated progress.
///
/// Owned by the render loop, not by the cycle.  A leg spans the nodes
/// between the previous and the current progress pointer, so the drawn
/// truck trails the simulation by at most one leg and comes to rest on the
/// node the simulation reports.
#[derive(Clone, Debug)]
pub struct LegClocks {
    legs:     HashMap<TruckCode, Leg>,
    per_node: Duration,
}

impl LegClocks {
    pub fn new(per_node: Duration) -> Self {
        Self { legs: HashMap::new(), per_node }
    }

    #[inline]
    pub fn per_node(&self) -> Duration {
        self.per_node
    }

    /// Follow `truck` to route index `progress`.  A new leg from the last
    /// tracked index starts at `at`; an unknown truck is parked on
    /// `progress`.  Returns `true` if a leg started.
    pub fn track(&mut self, truck: &TruckCode, progress: usize, at: Instant) -> bool {
        match self.legs.get_mut(truck) {
            Some(leg) if leg.to == progress => false,
            Some(leg) => {
                *leg = Leg { from: leg.to.min(progress), to: progress, start: at };
                true
            }
            None => {
                self.legs.insert(truck.clone(), Leg { from: progress, to: progress, start: at });
                false
            }
        }
    }

    /// Park every truck on its progress index, forgetting trucks not listed.
    /// Used when a new route set is adopted.
    pub fn park_all<'a>(
        &mut self,
        trucks: impl IntoIterator<Item = (&'a TruckCode, usize)>,
        at:     Instant,
    ) {
        self.legs.clear();
        for (code, progress) in trucks {
            self.legs.insert(code.clone(), Leg { from: progress, to: progress, start: at });
        }
    }

    pub fn leg_start(&self, truck: &TruckCode) -> Option<Instant> {
        self.legs.get(truck).map(|l| l.start)
    }

    /// Route indices `(from, to)` of the current leg of `truck`.
    pub fn leg(&self, truck: &TruckCode) -> Option<(usize, usize)> {
        self.legs.get(truck).map(|l| (l.from, l.to))
    }

    /// Pose of `truck` on `nodes` at `now`.  A truck with no recorded leg is
    /// parked on the first node.  Indices past the end of `nodes` clamp to
    /// the last node.
    pub fn pose(&self, truck: &TruckCode, nodes: &[GridPoint], now: Instant) -> Pose {
        let Some(last) = nodes.len().checked_sub(1) else {
            return Pose::parked(GridPoint::ORIGIN, 0);
        };
        let Some(leg) = self.legs.get(truck) else {
            return Pose::parked(nodes[0], 0);
        };
        let to = leg.to.min(last);
        let from = leg.from.min(to);
        let mut pose = pose_between(&nodes[from..=to], leg.start, now, self.per_node);
        pose.node_index += from;
        pose
    }

    pub fn clear(&mut self) {
        self.legs.clear();
    }
}
