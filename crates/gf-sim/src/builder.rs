//! Fluent builder for constructing a [`Cycle`].

use std::sync::Arc;

use chrono::TimeDelta;

use gf_core::{CycleClock, DiagnosticSink, EngineConfig, TracingSink};
use gf_fleet::{LoadModel, OrderBook, Solution};

use crate::{Cycle, SimError, SimResult};

/// Fluent builder for [`Cycle`].
///
/// # Required inputs
///
/// - [`EngineConfig`] — cycle length, span, tolerance, …
/// - the first [`Solution`], usually from `gf_intake::poll_first_solution`
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                       |
/// |--------------------|-------------------------------|
/// | `.sink(s)`         | [`TracingSink`]               |
/// | `.generation(g)`   | 0                             |
///
/// # Example
///
/// ```rust,ignore
/// let solution = poll_first_solution(&intake, start, every, attempts).await?;
/// let mut cycle = CycleBuilder::new(config, solution)
///     .sink(sink.clone())
///     .build()?;
/// cycle.tick(&mut NoopObserver);
/// ```
pub struct CycleBuilder {
    config:     EngineConfig,
    solution:   Solution,
    sink:       Option<Arc<dyn DiagnosticSink>>,
    generation: u64,
}

impl CycleBuilder {
    pub fn new(config: EngineConfig, solution: Solution) -> Self {
        Self { config, solution, sink: None, generation: 0 }
    }

    /// Where diagnostics raised while stepping go.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Starting generation.  A restarted engine passes a value above any
    /// generation an in-flight fetch may still carry.
    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Validate the configuration and solution and return a ready cycle.
    pub fn build(self) -> SimResult<Cycle> {
        self.config.validate().map_err(|e| SimError::Config(e.to_string()))?;
        if !self.solution.is_structurally_valid() {
            return Err(SimError::EmptySolution);
        }

        let clock = CycleClock::new(
            self.solution.interval_start,
            self.config.cycle_span(),
            self.config.steps_per_cycle,
        );
        let mut cycle = Cycle {
            load:               LoadModel { tonnes_per_m3: self.config.tonnes_per_m3 },
            config:             self.config,
            clock,
            trucks:             Vec::new(),
            routes:             Vec::new(),
            orders:             OrderBook::new(),
            warehouses:         Vec::new(),
            blockages:          Vec::new(),
            unassigned:         Vec::new(),
            sink:               self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            steps_remaining:    0,
            prefetch_requested: false,
            next:               None,
            generation:         self.generation,
            cycles_completed:   0,
            sim_elapsed:        TimeDelta::zero(),
        };
        cycle.install(self.solution);
        Ok(cycle)
    }
}
