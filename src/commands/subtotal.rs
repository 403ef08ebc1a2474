//! Subtotal command implementation.
//!
//! Single forward pass over an ordered report: every session row is
//! passed through unchanged, and a subtotal row summing the run's
//! measures is synthesized after the last row of each maximal run of
//! equal (film, dimension) keys, plus once at end-of-input.
//!
//! Grouping is purely adjacency-based. A key that reappears after a
//! different key starts a second, independent run; the pass never
//! merges non-adjacent runs and never reorders rows.

use crate::record::{GroupKey, Measures, ReportRow, ReportTotals, SessionRecord, SubtotalRecord};
use crate::report::{read_rows, ReportError, Result};
use crate::streaming::ReportWriter;
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;

/// Subtotal command configuration.
#[derive(Debug, Clone, Default)]
pub struct SubtotalCommand {
    /// Append the run's session count to each subtotal row
    pub count: bool,
    /// Append a grand-total row after the last subtotal
    pub grand_total: bool,
    /// Drop synthesized rows found in the input instead of failing
    pub skip_subtotals: bool,
}

impl SubtotalCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append session counts to subtotal rows.
    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Append a grand-total row.
    pub fn with_grand_total(mut self, grand_total: bool) -> Self {
        self.grand_total = grand_total;
        self
    }

    /// Drop synthesized input rows instead of failing.
    pub fn with_skip_subtotals(mut self, skip: bool) -> Self {
        self.skip_subtotals = skip;
        self
    }

    /// Aggregate detail rows, returning the interleaved output sequence.
    ///
    /// Every input record appears unchanged and in order; one subtotal
    /// follows each maximal run. Empty input produces empty output.
    pub fn aggregate(&self, sessions: Vec<SessionRecord>) -> Vec<ReportRow> {
        let mut out = Vec::with_capacity(sessions.len() + sessions.len() / 2 + 1);

        // Active run state
        let mut current_key: Option<GroupKey> = None;
        let mut run_totals = Measures::ZERO;
        let mut run_sessions = 0usize;
        let mut grand = ReportTotals::default();

        for rec in sessions {
            match current_key {
                Some(ref key) if *key != rec.key => {
                    out.push(ReportRow::Subtotal(SubtotalRecord {
                        key: key.clone(),
                        measures: run_totals,
                        sessions: run_sessions,
                    }));
                    run_totals = Measures::ZERO;
                    run_sessions = 0;
                    current_key = Some(rec.key.clone());
                }
                None => current_key = Some(rec.key.clone()),
                _ => {}
            }

            run_totals.add(&rec.measures);
            run_sessions += 1;
            if self.grand_total {
                grand.add_session(&rec.measures);
            }
            out.push(ReportRow::Session(rec));
        }

        // Close the final run, exactly once
        if let Some(key) = current_key {
            out.push(ReportRow::Subtotal(SubtotalRecord {
                key,
                measures: run_totals,
                sessions: run_sessions,
            }));
            if self.grand_total {
                out.push(ReportRow::GrandTotal(grand));
            }
        }

        out
    }

    /// Aggregate rows that may still contain synthesized rows.
    ///
    /// A subtotal must never be summed into a further subtotal. By
    /// default a synthesized input row fails the whole call; with
    /// `skip_subtotals` set it is dropped before aggregation.
    pub fn aggregate_rows(&self, rows: Vec<ReportRow>) -> Result<Vec<ReportRow>> {
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                ReportRow::Session(rec) => sessions.push(rec),
                row => {
                    if !self.skip_subtotals {
                        return Err(ReportError::InvalidFormat(format!(
                            "Input already contains a synthesized row: '{}' \
                             (re-run on the original detail rows, or pass --skip-subtotals)",
                            row
                        )));
                    }
                }
            }
        }
        Ok(self.aggregate(sessions))
    }

    /// Execute the subtotal pass on a report file.
    pub fn run<P: AsRef<Path>, W: Write>(&self, input: P, output: &mut W) -> Result<()> {
        let rows = read_rows(input)?;
        self.run_rows(rows, output)
    }

    /// Execute the subtotal pass on an already-read row sequence.
    ///
    /// All output goes through `ReportWriter` so the session-count
    /// column behaves the same on every input source.
    pub fn run_rows<W: Write>(&self, rows: Vec<ReportRow>, output: &mut W) -> Result<()> {
        let aggregated = self.aggregate_rows(rows)?;

        let mut writer = ReportWriter::new(output);
        for row in &aggregated {
            writer.write_row(row, self.count)?;
        }
        writer.flush()
    }

    /// Execute the subtotal pass on several report files.
    ///
    /// Files are aggregated in parallel; output buffers are written in
    /// argument order so the result is deterministic.
    pub fn run_many<P: AsRef<Path> + Sync, W: Write>(
        &self,
        inputs: &[P],
        output: &mut W,
    ) -> Result<()> {
        let buffers: Vec<Result<Vec<u8>>> = inputs
            .par_iter()
            .map(|path| {
                let mut buf = Vec::with_capacity(32 * 1024);
                self.run(path, &mut buf)?;
                Ok(buf)
            })
            .collect();

        for buf in buffers {
            output.write_all(&buf?).map_err(ReportError::Io)?;
        }
        Ok(())
    }
}
