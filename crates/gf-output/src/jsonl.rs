//! JSON-lines output backend.
//!
//! One self-contained JSON document per line, in the same camelCase shape a
//! view receives:
//! - `snapshots.jsonl`
//! - `tick_summaries.jsonl`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::writer::OutputWriter;
use crate::{OutputResult, RenderSnapshot, TickSummaryRow};

pub struct JsonLinesWriter {
    snapshots: BufWriter<File>,
    summaries: BufWriter<File>,
    finished:  bool,
}

impl JsonLinesWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let snapshots = BufWriter::new(File::create(dir.join("snapshots.jsonl"))?);
        let summaries = BufWriter::new(File::create(dir.join("tick_summaries.jsonl"))?);
        Ok(Self { snapshots, summaries, finished: false })
    }
}

impl OutputWriter for JsonLinesWriter {
    fn write_snapshot(&mut self, snapshot: &RenderSnapshot) -> OutputResult<()> {
        serde_json::to_writer(&mut self.snapshots, snapshot)?;
        self.snapshots.write_all(b"\n")?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        serde_json::to_writer(&mut self.summaries, row)?;
        self.summaries.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
