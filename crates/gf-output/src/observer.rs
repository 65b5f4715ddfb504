//! `SnapshotObserver<W>` — bridges `CycleObserver` to an `OutputWriter`.

use gf_sim::{Cycle, CycleObserver, TickReport};

use crate::row::TickSummaryRow;
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult, RenderSnapshot};

/// A [`CycleObserver`] that writes a tick summary every tick and a full
/// snapshot every `snapshot_every` ticks to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because observer hooks
/// have no return value.  Check them with [`take_error`][Self::take_error].
pub struct SnapshotObserver<W: OutputWriter> {
    writer:         W,
    snapshot_every: u64,
    ticks_seen:     u64,
    last_error:     Option<OutputError>,
}

impl<W: OutputWriter> SnapshotObserver<W> {
    /// `snapshot_every = 0` disables snapshots; summaries are still written.
    pub fn new(writer: W, snapshot_every: u64) -> Self {
        Self { writer, snapshot_every, ticks_seen: 0, last_error: None }
    }

    /// Write a snapshot outside the tick cadence (e.g. on stop).
    pub fn snapshot_now(&mut self, cycle: &Cycle) {
        let result = self.writer.write_snapshot(&RenderSnapshot::capture(cycle, None));
        self.store_err(result);
    }

    /// Flush the writer.  Idempotent.
    pub fn finish(&mut self) {
        let result = self.writer.finish();
        self.store_err(result);
    }

    /// Take the stored write error, if any.  Returns `None` if all writes
    /// succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    #[inline]
    pub fn ticks_seen(&self) -> u64 {
        self.ticks_seen
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "output write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> CycleObserver for SnapshotObserver<W> {
    fn on_tick_end(&mut self, cycle: &Cycle, report: &TickReport) {
        self.ticks_seen += 1;
        let result = self.writer.write_tick_summary(&TickSummaryRow::from_tick(cycle, report));
        self.store_err(result);

        if self.snapshot_every > 0 && self.ticks_seen % self.snapshot_every == 0 {
            self.snapshot_now(cycle);
        }
    }
}
