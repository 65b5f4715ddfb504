//! Background fetch of the next solution.
//!
//! At most one fetch is in flight.  Each request is tagged with the cycle
//! generation it was made for; a result that arrives after the cycle moved
//! on (hand-off, restart, stop) is discarded instead of adopted.  A request
//! suspended while paused is re-issued on resume, whatever its purpose.

use chrono::NaiveDateTime;
use tokio::sync::oneshot::{self, error::TryRecvError};

use gf_core::{Diagnostic, DiagnosticKind};
use gf_fleet::Solution;

use crate::{Intake, IntakeResult, TaskHandle};

/// Why a fetch was requested.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FetchPurpose {
    /// The solution for the interval after the active cycle.
    NextCycle,
    /// A recomputed solution for the current instant, after a breakdown.
    Replan,
}

/// A fetch result that is still valid for the current generation.
#[derive(Debug)]
pub struct Prefetched {
    pub purpose:        FetchPurpose,
    pub generation:     u64,
    pub interval_start: NaiveDateTime,
    pub solution:       Solution,
}

#[derive(Copy, Clone, Debug)]
struct Request {
    purpose:        FetchPurpose,
    generation:     u64,
    interval_start: NaiveDateTime,
}

struct Pending {
    request: Request,
    rx:      oneshot::Receiver<IntakeResult<Option<Solution>>>,
    task:    TaskHandle,
}

pub struct Prefetcher {
    intake:    Intake,
    pending:   Option<Pending>,
    suspended: Option<Request>,
}

impl Prefetcher {
    pub fn new(intake: Intake) -> Self {
        Self { intake, pending: None, suspended: None }
    }

    /// Start fetching.  A different in-flight request is cancelled first; an
    /// identical one is left alone and `false` is returned.
    pub fn request(
        &mut self,
        purpose:        FetchPurpose,
        generation:     u64,
        interval_start: NaiveDateTime,
    ) -> bool {
        if let Some(p) = &self.pending {
            let r = p.request;
            if r.purpose == purpose && r.generation == generation && r.interval_start == interval_start {
                return false;
            }
        }
        self.cancel();

        let (tx, rx) = oneshot::channel();
        let intake = self.intake.clone();
        let task = TaskHandle::spawn("prefetch", async move {
            let result = intake.fetch(interval_start).await;
            // The receiver is gone if the request was superseded.
            let _ = tx.send(result);
        });
        tracing::info!(?purpose, generation, start = %interval_start, "fetch requested");
        self.pending = Some(Pending {
            request: Request { purpose, generation, interval_start },
            rx,
            task,
        });
        true
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Purpose of the in-flight request, if any.
    pub fn pending_purpose(&self) -> Option<FetchPurpose> {
        self.pending.as_ref().map(|p| p.request.purpose)
    }

    /// Non-blocking: the finished result, if it is ready and still belongs
    /// to `current_generation`.
    pub fn try_take(&mut self, current_generation: u64) -> Option<Prefetched> {
        let pending = self.pending.as_mut()?;
        match pending.rx.try_recv() {
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                None
            }
            Ok(result) => {
                let request = pending.request;
                self.pending = None;
                self.accept(request, result, current_generation)
            }
        }
    }

    /// Block until the in-flight request finishes.  `None` if nothing was
    /// pending or the result is unusable.
    pub async fn wait(&mut self, current_generation: u64) -> Option<Prefetched> {
        let Pending { request, rx, task } = self.pending.take()?;
        let result = rx.await;
        drop(task);
        match result {
            Ok(result) => self.accept(request, result, current_generation),
            Err(_) => None,
        }
    }

    /// Drop the in-flight request, keeping it for [`resume`](Self::resume).
    /// Returns `false` if nothing was in flight.
    pub fn suspend(&mut self) -> bool {
        let request = self.pending.as_ref().map(|p| p.request);
        let cancelled = self.cancel();
        self.suspended = request;
        cancelled
    }

    /// Re-issue the request dropped by [`suspend`](Self::suspend) if it was
    /// made for `current_generation` and nothing else is in flight.  Returns
    /// the purpose of the re-issued request.
    pub fn resume(&mut self, current_generation: u64) -> Option<FetchPurpose> {
        let r = self.suspended.take()?;
        if r.generation != current_generation || self.pending.is_some() {
            tracing::debug!(generation = r.generation, current_generation, "suspended fetch dropped");
            return None;
        }
        self.request(r.purpose, r.generation, r.interval_start);
        Some(r.purpose)
    }

    /// Drop the in-flight request and any suspended one.  Idempotent.
    pub fn cancel(&mut self) -> bool {
        self.suspended = None;
        match self.pending.take() {
            Some(mut p) => {
                p.task.cancel();
                tracing::debug!(generation = p.request.generation, "fetch cancelled");
                true
            }
            None => false,
        }
    }

    fn accept(
        &self,
        request: Request,
        result:  IntakeResult<Option<Solution>>,
        current: u64,
    ) -> Option<Prefetched> {
        if request.generation != current {
            tracing::debug!(
                requested = request.generation,
                current,
                "stale fetch result discarded"
            );
            return None;
        }
        match result {
            Ok(Some(solution)) => Some(Prefetched {
                purpose:        request.purpose,
                generation:     request.generation,
                interval_start: request.interval_start,
                solution,
            }),
            Ok(None) => {
                tracing::debug!(start = %request.interval_start, "fetched solution not ready");
                None
            }
            Err(e) => {
                self.intake.sink().report(Diagnostic::new(
                    DiagnosticKind::FetchFailure,
                    request.interval_start.to_string(),
                    e.to_string(),
                ));
                None
            }
        }
    }
}
