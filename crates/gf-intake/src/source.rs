//! Where solutions come from.
//!
//! [`SolutionSource`] is the seam to the external solver.  The engine only
//! needs three operations: fetch the solution for an interval, tell the
//! solver to forget its state, and report a breakdown so it can re-plan.
//!
//! Two sources ship with the crate:
//!
//! - [`JsonDirSource`] reads solver dumps from a directory, one file per
//!   interval start, named `YYYY-MM-DDTHH-MM-SS.json`.  A missing file means
//!   "not ready yet".
//! - [`ScriptedSource`] replays an in-memory queue of responses, optionally
//!   falling back to a generator closure.  Used by tests and the demo.
//!
//! [`Intake`] wraps a source with normalization and the diagnostic sink.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};
use tokio::io::AsyncWriteExt;

use gf_core::{DiagnosticSink, TruckCode};
use gf_fleet::{LoadModel, Solution};

use crate::normalize::{NormalizeContext, normalize};
use crate::wire::SolverResponse;
use crate::{IntakeError, IntakeResult};

/// File-name timestamp format used by [`JsonDirSource`].
pub const FILE_STAMP: &str = "%Y-%m-%dT%H-%M-%S";

/// The external solver, seen from the engine.
#[async_trait]
pub trait SolutionSource: Send + Sync + 'static {
    /// The solver's answer for the interval starting at `interval_start`,
    /// or `None` if it is not ready yet.
    async fn fetch(&self, interval_start: NaiveDateTime) -> IntakeResult<Option<SolverResponse>>;

    /// Discard any in-progress solver state.
    async fn reset(&self) -> IntakeResult<()>;

    /// Tell the solver `truck` broke down with `severity` at simulated time `at`.
    async fn report_breakdown(&self, truck: &TruckCode, severity: u8, at: NaiveDateTime)
        -> IntakeResult<()>;
}

// ── Intake ────────────────────────────────────────────────────────────────────

/// A source plus everything needed to turn its responses into solutions.
/// Cheap to clone; clones share the source and the sink.
#[derive(Clone)]
pub struct Intake {
    source: Arc<dyn SolutionSource>,
    sink:   Arc<dyn DiagnosticSink>,
    span:   TimeDelta,
    load:   LoadModel,
}

impl Intake {
    pub fn new(
        source: Arc<dyn SolutionSource>,
        sink:   Arc<dyn DiagnosticSink>,
        span:   TimeDelta,
        load:   LoadModel,
    ) -> Self {
        Self { source, sink, span, load }
    }

    #[inline]
    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// The sink as an owned handle, for components that outlive a borrow.
    pub fn shared_sink(&self) -> Arc<dyn DiagnosticSink> {
        Arc::clone(&self.sink)
    }

    /// Fetch and normalize.  `Ok(None)` when the solver has nothing yet or
    /// returned a structurally invalid (route-less) solution.
    pub async fn fetch(&self, interval_start: NaiveDateTime) -> IntakeResult<Option<Solution>> {
        let Some(response) = self.source.fetch(interval_start).await? else {
            return Ok(None);
        };
        let cx = NormalizeContext {
            requested_start: interval_start,
            span:            self.span,
            load:            self.load,
            sink:            self.sink.as_ref(),
        };
        let solution = normalize(response, &cx);
        if solution.is_structurally_valid() {
            Ok(Some(solution))
        } else {
            tracing::debug!(start = %interval_start, "solution has no routes yet");
            Ok(None)
        }
    }

    pub async fn reset(&self) -> IntakeResult<()> {
        self.source.reset().await
    }

    pub async fn report_breakdown(
        &self,
        truck:    &TruckCode,
        severity: u8,
        at:       NaiveDateTime,
    ) -> IntakeResult<()> {
        self.source.report_breakdown(truck, severity, at).await
    }
}

// ── JsonDirSource ─────────────────────────────────────────────────────────────

/// Reads `<dir>/<interval start>.json`; appends breakdown reports to
/// `<dir>/breakdowns.jsonl`.
#[derive(Clone, Debug)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the dump for `interval_start`.
    pub fn path_for(&self, interval_start: NaiveDateTime) -> PathBuf {
        self.dir.join(format!("{}.json", interval_start.format(FILE_STAMP)))
    }
}

#[async_trait]
impl SolutionSource for JsonDirSource {
    async fn fetch(&self, interval_start: NaiveDateTime) -> IntakeResult<Option<SolverResponse>> {
        let path = self.path_for(interval_start);
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(SolverResponse::from_json(&body)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no solver dump yet");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn reset(&self) -> IntakeResult<()> {
        tracing::info!(dir = %self.dir.display(), "solver reset requested");
        Ok(())
    }

    async fn report_breakdown(&self, truck: &TruckCode, severity: u8, at: NaiveDateTime)
        -> IntakeResult<()>
    {
        let line = serde_json::json!({
            "truck":    truck.as_str(),
            "severity": severity,
            "at":       at,
        });
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("breakdowns.jsonl"))
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

// ── ScriptedSource ────────────────────────────────────────────────────────────

/// One scripted reply.
#[derive(Clone, Debug)]
pub enum Scripted {
    Ready(SolverResponse),
    NotReady,
    Fail(String),
}

type Generator = dyn Fn(NaiveDateTime) -> Option<SolverResponse> + Send + Sync;

#[derive(Default)]
struct Script {
    replies:    VecDeque<Scripted>,
    requests:   Vec<NaiveDateTime>,
    breakdowns: Vec<(TruckCode, u8, NaiveDateTime)>,
    resets:     usize,
}

/// In-memory solver.  Replies are consumed in order; once the queue is empty
/// the generator (if any) answers, otherwise "not ready".
#[derive(Default)]
pub struct ScriptedSource {
    script:    Mutex<Script>,
    generator: Option<Box<Generator>>,
    latency:   Duration,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request past the scripted queue with `f`.
    pub fn with_generator<F>(mut self, f: F) -> Self
    where
        F: Fn(NaiveDateTime) -> Option<SolverResponse> + Send + Sync + 'static,
    {
        self.generator = Some(Box::new(f));
        self
    }

    /// Delay every reply by `latency` (simulated solver time).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, reply: Scripted) {
        self.lock().replies.push_back(reply);
    }

    /// Interval starts requested so far, in order.
    pub fn requests(&self) -> Vec<NaiveDateTime> {
        self.lock().requests.clone()
    }

    pub fn breakdowns(&self) -> Vec<(TruckCode, u8, NaiveDateTime)> {
        self.lock().breakdowns.clone()
    }

    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SolutionSource for ScriptedSource {
    async fn fetch(&self, interval_start: NaiveDateTime) -> IntakeResult<Option<SolverResponse>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = {
            let mut script = self.lock();
            script.requests.push(interval_start);
            script.replies.pop_front()
        };
        match reply {
            Some(Scripted::Ready(response)) => Ok(Some(response)),
            Some(Scripted::NotReady) => Ok(None),
            Some(Scripted::Fail(reason)) => Err(IntakeError::Transport(reason)),
            None => Ok(self.generator.as_ref().and_then(|g| g(interval_start))),
        }
    }

    async fn reset(&self) -> IntakeResult<()> {
        let mut script = self.lock();
        script.resets += 1;
        script.replies.clear();
        Ok(())
    }

    async fn report_breakdown(&self, truck: &TruckCode, severity: u8, at: NaiveDateTime)
        -> IntakeResult<()>
    {
        self.lock().breakdowns.push((truck.clone(), severity, at));
        Ok(())
    }
}
