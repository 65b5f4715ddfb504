//! The `OutputWriter` trait implemented by all export backends.

use crate::{OutputResult, RenderSnapshot, TickSummaryRow};

/// Trait implemented by [`CsvWriter`][crate::CsvWriter] and
/// [`JsonLinesWriter`][crate::JsonLinesWriter].
///
/// Errors surface through [`SnapshotObserver::take_error`][crate::SnapshotObserver::take_error]
/// when the writer is driven by the observer.
pub trait OutputWriter {
    /// Write every truck, order and warehouse of one snapshot.
    fn write_snapshot(&mut self, snapshot: &RenderSnapshot) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush all underlying file handles.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
