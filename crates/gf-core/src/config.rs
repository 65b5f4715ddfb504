//! Engine configuration.
//!
//! Loaded from JSON by the application crate (see `demos/replay`) and passed
//! to the cycle builder, the playback clock and the startup poller.  Every
//! field has a default matching the reference deployment.

use std::time::Duration;

use chrono::TimeDelta;

use crate::{CoreError, CoreResult};

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct EngineConfig {
    /// Discrete steps per routing solution.  Default: 140.
    pub steps_per_cycle: u32,

    /// Simulated seconds covered by one cycle.  Default: 7 200 (2 h).
    pub cycle_span_secs: u32,

    /// Fraction of the cycle left when the next solution is prefetched.
    /// Default: 0.10 (step 126 of 140).
    pub prefetch_fraction: f64,

    /// An order counts as satisfied once `delivered >= assigned - tolerance`.
    pub delivery_tolerance: f64,

    /// Tonnes per cubic metre of liquefied gas.  Default: 0.5.
    pub tonnes_per_m3: f64,

    /// Wall-clock seconds per simulated node at reference speed.
    pub secs_per_node: f64,

    /// Fleet speed (km/h) at which `secs_per_node` applies unscaled.
    pub reference_speed: f64,

    /// Fleet speed assumed when no truck is active.
    pub default_speed: f64,

    /// Lower bound on the playback timer period, milliseconds.
    pub min_period_ms: u64,

    /// Wall-clock duration per node for the render interpolator, milliseconds.
    pub render_ms_per_node: u64,

    /// Startup poll spacing, milliseconds.
    pub poll_interval_ms: u64,

    /// Startup poll budget.
    pub poll_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            steps_per_cycle:    140,
            cycle_span_secs:    7_200,
            prefetch_fraction:  0.10,
            delivery_tolerance: 1e-3,
            tonnes_per_m3:      0.5,
            secs_per_node:      36.0,
            reference_speed:    60.0,
            default_speed:      60.0,
            min_period_ms:      10,
            render_ms_per_node: 1_000,
            poll_interval_ms:   2_000,
            poll_attempts:      60,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> CoreResult<()> {
        if self.steps_per_cycle == 0 {
            return Err(CoreError::Config("steps_per_cycle must be > 0".into()));
        }
        if self.cycle_span_secs == 0 {
            return Err(CoreError::Config("cycle_span_secs must be > 0".into()));
        }
        if !(self.prefetch_fraction > 0.0 && self.prefetch_fraction < 1.0) {
            return Err(CoreError::Config(format!(
                "prefetch_fraction must be in (0, 1), got {}",
                self.prefetch_fraction
            )));
        }
        let threshold = (self.steps_per_cycle as f64 * self.prefetch_fraction).round();
        if threshold >= self.steps_per_cycle as f64 {
            return Err(CoreError::Config(format!(
                "prefetch_fraction {} leaves no step before the threshold of {} steps",
                self.prefetch_fraction, self.steps_per_cycle
            )));
        }
        if !(self.delivery_tolerance.is_finite() && self.delivery_tolerance >= 0.0) {
            return Err(CoreError::Config("delivery_tolerance must be finite and >= 0".into()));
        }
        if !(self.tonnes_per_m3.is_finite() && self.tonnes_per_m3 > 0.0) {
            return Err(CoreError::Config("tonnes_per_m3 must be finite and > 0".into()));
        }
        for (name, v) in [
            ("secs_per_node", self.secs_per_node),
            ("reference_speed", self.reference_speed),
            ("default_speed", self.default_speed),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(CoreError::Config(format!("{name} must be finite and > 0")));
            }
        }
        if self.render_ms_per_node == 0 {
            return Err(CoreError::Config("render_ms_per_node must be > 0".into()));
        }
        if self.poll_attempts == 0 {
            return Err(CoreError::Config("poll_attempts must be > 0".into()));
        }
        Ok(())
    }

    /// `steps_remaining - 1` value at which the prefetch fires.
    ///
    /// 10 % of 140 is 14, so the prefetch fires on step 126.  Never above
    /// `steps_per_cycle - 1`.
    pub fn prefetch_threshold(&self) -> u32 {
        let threshold = (self.steps_per_cycle as f64 * self.prefetch_fraction).round() as u32;
        threshold.min(self.steps_per_cycle.saturating_sub(1))
    }

    #[inline]
    pub fn cycle_span(&self) -> TimeDelta {
        TimeDelta::seconds(self.cycle_span_secs as i64)
    }

    #[inline]
    pub fn min_period(&self) -> Duration {
        Duration::from_millis(self.min_period_ms)
    }

    #[inline]
    pub fn render_per_node(&self) -> Duration {
        Duration::from_millis(self.render_ms_per_node)
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
