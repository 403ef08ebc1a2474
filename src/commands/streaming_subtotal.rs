//! Streaming subtotal implementation with O(1) memory complexity.
//!
//! Synthesizes subtotal rows for a grouped report without loading the
//! whole file into memory.
//!
//! # Algorithm
//!
//! For grouped input:
//! 1. Read rows one at a time
//! 2. Track the active run (key, measure accumulators, session count)
//! 3. If the next row's key matches the active run, accumulate
//! 4. If not, emit the run's subtotal and start a new run
//! 5. After the last row, emit the final run's subtotal exactly once
//!
//! # Memory complexity
//!
//! O(1) - only the active run state is held, regardless of input size.
//!
//! # Requirements
//!
//! Equal keys MUST be contiguous in the input (pre-sorted report).

use crate::record::{GroupKey, Measures, ReportRow, ReportTotals, SubtotalRecord};
use crate::report::{ReportError, ReportReader, Result};
use crate::streaming::ReportWriter;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Streaming subtotal command configuration.
#[derive(Debug, Clone, Default)]
pub struct StreamingSubtotalCommand {
    /// Append the run's session count to each subtotal row
    pub count: bool,
    /// Append a grand-total row after the last subtotal
    pub grand_total: bool,
    /// Drop synthesized rows found in the input instead of failing
    pub skip_subtotals: bool,
}

impl StreamingSubtotalCommand {
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

    /// Execute the streaming subtotal pass on a report file.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<SubtotalStats> {
        let file = File::open(input_path.as_ref())?;
        let reader = ReportReader::with_capacity(file, 64 * 1024);
        self.run_streaming(reader, output)
    }

    /// Execute the streaming subtotal pass from stdin.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<SubtotalStats> {
        let stdin = io::stdin();
        let reader = ReportReader::new(stdin.lock());
        self.run_streaming(reader, output)
    }

    /// Core streaming subtotal pass.
    ///
    /// Maintains only the active run in memory.
    pub fn run_streaming<R: Read, W: Write>(
        &self,
        reader: ReportReader<R>,
        output: &mut W,
    ) -> Result<SubtotalStats> {
        let mut stats = SubtotalStats::default();
        let mut writer = ReportWriter::new(output);

        // Active run state
        let mut current_key: Option<GroupKey> = None;
        let mut run_totals = Measures::ZERO;
        let mut run_sessions = 0usize;
        let mut grand = ReportTotals::default();

        for result in reader.rows() {
            let rec = match result? {
                ReportRow::Session(rec) => rec,
                row => {
                    if self.skip_subtotals {
                        continue;
                    }
                    return Err(ReportError::InvalidFormat(format!(
                        "Input already contains a synthesized row: '{}' \
                         (re-run on the original detail rows, or pass --skip-subtotals)",
                        row
                    )));
                }
            };
            stats.rows_read += 1;

            match current_key {
                Some(ref key) if *key != rec.key => {
                    writer.write_subtotal(
                        &SubtotalRecord {
                            key: key.clone(),
                            measures: run_totals,
                            sessions: run_sessions,
                        },
                        self.count,
                    )?;
                    stats.subtotals_written += 1;
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
            writer.write_session(&rec)?;
        }

        // Close the final run, exactly once
        if let Some(key) = current_key {
            writer.write_subtotal(
                &SubtotalRecord {
                    key,
                    measures: run_totals,
                    sessions: run_sessions,
                },
                self.count,
            )?;
            stats.subtotals_written += 1;
            if self.grand_total {
                writer.write_grand_total(&grand, self.count)?;
            }
        }

        writer.flush()?;
        Ok(stats)
    }
}

/// Statistics from a streaming subtotal pass.
#[derive(Debug, Default, Clone)]
pub struct SubtotalStats {
    /// Number of session rows read
    pub rows_read: usize,
    /// Number of subtotal rows written
    pub subtotals_written: usize,
}

impl SubtotalStats {
    /// Mean run length (how many sessions per subtotal).
    pub fn mean_run_length(&self) -> f64 {
        if self.subtotals_written == 0 {
            0.0
        } else {
            self.rows_read as f64 / self.subtotals_written as f64
        }
    }
}

impl std::fmt::Display for SubtotalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sessions: {}, Subtotals: {}, Mean run: {:.2}",
            self.rows_read,
            self.subtotals_written,
            self.mean_run_length()
        )
    }
}
