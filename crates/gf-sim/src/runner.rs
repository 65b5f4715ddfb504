//! Async driver tying the playback clock, the cycle and solution intake
//! together.
//!
//! The runner is a single task: it awaits one clock tick, runs the cycle
//! tick to completion, then reacts to what the tick reported.
//!
//! ```text
//! ① absorb     finished background fetches (next cycle or re-plan)
//! ② tick       Cycle::tick
//! ③ breakdowns report to the solver and request a re-plan
//! ④ prefetch   request the next cycle's solution when the tick says so
//! ⑤ fallback   exhausted cycle: wait for / fetch the next solution inline
//! ⑥ pacing     recompute the dynamic period
//! ```

use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tokio::time::Instant;

use gf_core::{EngineConfig, TruckCode};
use gf_intake::{FetchPurpose, Intake, Prefetched, Prefetcher, poll_first_solution};
use gf_motion::LegClocks;

use crate::{
    BreakdownReport, Cycle, CycleBuilder, CycleObserver, PlaybackClock, PlaybackMode, SimError,
    SimResult, TickReport, tick_period,
};

pub struct Runner<O: CycleObserver> {
    config:          EngineConfig,
    intake:          Intake,
    prefetcher:      Prefetcher,
    clock:           PlaybackClock,
    ticks:           mpsc::Receiver<u64>,
    mode:            PlaybackMode,
    cycle:           Option<Cycle>,
    observer:        O,
    legs:            LegClocks,
    start_at:        NaiveDateTime,
    next_generation: u64,
    started_wall:    Option<Instant>,
}

impl<O: CycleObserver> Runner<O> {
    /// A stopped runner that will poll for the solution starting at
    /// `start_at` when [`start`](Self::start) is called.
    pub fn new(
        config:   EngineConfig,
        intake:   Intake,
        start_at: NaiveDateTime,
        observer: O,
    ) -> SimResult<Self> {
        config.validate().map_err(|e| SimError::Config(e.to_string()))?;
        let mode = PlaybackMode::dynamic(&config);
        let (clock, ticks) = PlaybackClock::new(tick_period(mode, &[], &config));
        Ok(Self {
            prefetcher: Prefetcher::new(intake.clone()),
            legs: LegClocks::new(config.render_per_node()),
            config,
            intake,
            clock,
            ticks,
            mode,
            cycle: None,
            observer,
            start_at,
            next_generation: 0,
            started_wall: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Start or resume.
    ///
    /// Without an active cycle this polls for the first solution, which may
    /// take up to `poll_attempts × poll_interval`.  A runner that is already
    /// ticking is left alone.
    ///
    /// # Errors
    ///
    /// `SimError::Intake(NotAvailable)` when the poll budget runs out.
    pub async fn start(&mut self) -> SimResult<()> {
        if self.cycle.is_some() && self.clock.is_running() {
            return Ok(());
        }

        if let Some(cycle) = &self.cycle {
            // The fetch suspended by `stop` is re-issued, whatever its purpose.
            let status = cycle.status();
            let resumed = self.prefetcher.resume(status.generation);
            if resumed.is_none()
                && status.prefetch_requested
                && !status.next_ready
                && !self.prefetcher.is_pending()
            {
                self.prefetcher.request(
                    FetchPurpose::NextCycle,
                    status.generation,
                    cycle.clock.next_cycle_start(),
                );
            }
        } else {
            let solution = poll_first_solution(
                &self.intake,
                self.start_at,
                self.config.poll_interval(),
                self.config.poll_attempts,
            )
            .await?;
            let cycle = CycleBuilder::new(self.config.clone(), solution)
                .sink(self.intake.shared_sink())
                .generation(self.next_generation)
                .build()?;
            self.observer.on_handoff(cycle.generation(), cycle.clock.cycle_start);
            self.cycle = Some(cycle);
            self.park_legs();
        }

        self.update_period();
        self.clock.start();
        self.started_wall.get_or_insert_with(Instant::now);
        Ok(())
    }

    /// Pause ticking and suspend any in-flight fetch until the next
    /// [`start`](Self::start).  Returns `false` if nothing was running.  The
    /// cycle state is kept for rendering.
    pub fn stop(&mut self) -> bool {
        let stopped = self.clock.stop();
        let cancelled = self.prefetcher.suspend();
        while self.ticks.try_recv().is_ok() {}
        stopped || cancelled
    }

    /// Stop, discard all state, reset the solution source and poll again.
    pub async fn restart(&mut self) -> SimResult<()> {
        self.stop();
        self.prefetcher.cancel();
        if let Some(old) = self.cycle.take() {
            self.next_generation = old.generation() + 1;
        }
        self.legs.clear();
        self.intake.reset().await?;
        tracing::info!(generation = self.next_generation, "simulation restarted");
        self.start().await
    }

    // ── Ticking ───────────────────────────────────────────────────────────

    /// Wait for the next clock tick and process it.
    ///
    /// # Errors
    ///
    /// - `NotStarted` before the first successful [`start`](Self::start)
    /// - `NotRunning` while the clock is stopped
    /// - `SolutionUnavailable` when the cycle ran out and no next solution
    ///   could be obtained; the last state stays in place
    pub async fn step(&mut self) -> SimResult<TickReport> {
        if self.cycle.is_none() {
            return Err(SimError::NotStarted);
        }
        if !self.clock.is_running() {
            return Err(SimError::NotRunning);
        }
        let seq = self.ticks.recv().await.ok_or(SimError::NotRunning)?;
        self.clock.consumed(seq);
        self.process_tick().await
    }

    /// Run one tick without waiting for the clock.
    pub async fn process_tick(&mut self) -> SimResult<TickReport> {
        let generation = self.cycle_ref()?.generation();

        // ①
        if let Some(fetched) = self.prefetcher.try_take(generation) {
            self.absorb(fetched);
        }

        // ②
        let mut report = {
            let cycle = self.cycle.as_mut().ok_or(SimError::NotStarted)?;
            cycle.tick(&mut self.observer)
        };
        if report.handoff.is_some() {
            self.park_legs();
        } else {
            self.track_legs();
        }

        // ③
        for b in report.breakdowns.iter().filter(|b| b.needs_replan()) {
            self.replan_after(b).await;
        }

        // ④
        if let Some(next_start) = report.prefetch_due {
            if self.prefetcher.pending_purpose() == Some(FetchPurpose::Replan) {
                tracing::debug!("re-plan in flight, next-cycle prefetch skipped");
            } else {
                let generation = self.cycle_ref()?.generation();
                self.prefetcher.request(FetchPurpose::NextCycle, generation, next_start);
            }
        }

        // ⑤
        if report.exhausted {
            report.handoff = Some(self.fallback().await?);
        }

        // ⑥
        self.update_period();
        Ok(report)
    }

    /// Break `truck` down on operator request, tell the solver and ask for
    /// a re-plan.  `Ok(None)` if the truck is unknown or already broken.
    pub async fn report_breakdown(
        &mut self,
        truck:    &TruckCode,
        severity: u8,
    ) -> SimResult<Option<BreakdownReport>> {
        let cycle = self.cycle.as_mut().ok_or(SimError::NotStarted)?;
        let Some(report) = cycle.force_breakdown(truck, severity) else {
            return Ok(None);
        };
        self.observer.on_breakdown(&report);
        self.replan_after(&report).await;
        self.update_period();
        Ok(Some(report))
    }

    // ── Pacing ────────────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
        self.update_period();
    }

    #[inline]
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.clock.period()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn cycle(&self) -> Option<&Cycle> {
        self.cycle.as_ref()
    }

    pub fn legs(&self) -> &LegClocks {
        &self.legs
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Wall-clock time since the first successful start.
    pub fn wall_elapsed(&self) -> Duration {
        self.started_wall.map(|t| t.elapsed()).unwrap_or_default()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn cycle_ref(&self) -> SimResult<&Cycle> {
        self.cycle.as_ref().ok_or(SimError::NotStarted)
    }

    /// Park every render leg on its truck's progress.  Used on adoption.
    fn park_legs(&mut self) {
        if let Some(cycle) = &self.cycle {
            self.legs.park_all(
                cycle.trucks.iter().map(|t| (&t.code, t.progress)),
                Instant::now().into_std(),
            );
        }
    }

    /// Start a render leg for every truck whose progress moved.
    fn track_legs(&mut self) {
        if let Some(cycle) = &self.cycle {
            let now = Instant::now().into_std();
            for truck in &cycle.trucks {
                self.legs.track(&truck.code, truck.progress, now);
            }
        }
    }

    fn update_period(&mut self) {
        let trucks = self.cycle.as_ref().map(|c| c.trucks.as_slice()).unwrap_or(&[]);
        self.clock.set_period(tick_period(self.mode, trucks, &self.config));
    }

    /// Hand a finished fetch to the cycle.
    fn absorb(&mut self, fetched: Prefetched) {
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        match fetched.purpose {
            FetchPurpose::NextCycle => {
                if !cycle.offer_next(fetched.solution) {
                    tracing::debug!(start = %fetched.interval_start, "prefetched solution rejected");
                }
            }
            FetchPurpose::Replan => {
                if let Some(generation) = cycle.adopt(fetched.solution) {
                    tracing::info!(generation, start = %fetched.interval_start, "re-planned solution adopted");
                    self.observer.on_handoff(generation, cycle.clock.cycle_start);
                    self.park_legs();
                }
            }
        }
    }

    async fn replan_after(&mut self, breakdown: &BreakdownReport) {
        if let Err(e) = self
            .intake
            .report_breakdown(&breakdown.truck, breakdown.severity, breakdown.at)
            .await
        {
            tracing::warn!(truck = %breakdown.truck, error = %e, "breakdown report failed");
        }
        let Some(cycle) = &self.cycle else {
            return;
        };
        self.prefetcher
            .request(FetchPurpose::Replan, cycle.generation(), cycle.now());
    }

    /// Degraded path: the cycle ran out before a prefetched solution was
    /// offered.  Waits for the in-flight fetch, then fetches directly.
    async fn fallback(&mut self) -> SimResult<u64> {
        let (generation, next_start) = {
            let cycle = self.cycle_ref()?;
            (cycle.generation(), cycle.clock.next_cycle_start())
        };
        tracing::warn!(generation, start = %next_start, "cycle exhausted, fetching next solution inline");

        if let Some(fetched) = self.prefetcher.wait(generation).await {
            self.absorb(fetched);
        }
        if let Some(generation) = self.try_hand_off() {
            return Ok(generation);
        }
        // A re-plan adopted above already resolved the exhaustion.
        let cycle = self.cycle_ref()?;
        if !cycle.is_exhausted() {
            return Ok(cycle.generation());
        }

        let unavailable = |reason: String| SimError::SolutionUnavailable { at: next_start, reason };
        let solution = match self.intake.fetch(next_start).await {
            Ok(Some(solution)) => solution,
            Ok(None) => return Err(unavailable("solver has no solution yet".into())),
            Err(e) => return Err(unavailable(e.to_string())),
        };
        let cycle = self.cycle.as_mut().ok_or(SimError::NotStarted)?;
        if !cycle.offer_next(solution) {
            return Err(unavailable("fetched solution has no routes".into()));
        }
        self.try_hand_off()
            .ok_or_else(|| unavailable("hand-off did not take place".into()))
    }

    fn try_hand_off(&mut self) -> Option<u64> {
        let generation = self.cycle.as_mut()?.hand_off_pending(&mut self.observer)?;
        self.park_legs();
        Some(generation)
    }
}
