//! Grouped-order validation for streaming operations.
//!
//! Subtotal aggregation closes a run at every key change, so a key that
//! reappears after a different key produces two independent subtotals.
//! That is the documented adjacency contract, but on a report that was
//! supposed to be sorted it almost always means the sort step was
//! skipped. This module verifies that equal keys are contiguous before
//! processing, the same way a sorted-input check would.

use crate::report::{ReportError, Result};
use crate::streaming::parsing::{is_synthesized_line, parse_key_bytes, should_skip_line};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Verify that a report file keeps equal keys contiguous.
///
/// Returns Ok(()) if grouped, Err with the offending line if a key
/// reappears after a different key. Synthesized rows are ignored.
///
/// # Example
///
/// ```rust,no_run
/// use rollup_reports::streaming::verify_grouped;
///
/// verify_grouped("report.tsv").expect("Report must be grouped");
/// ```
pub fn verify_grouped<P: AsRef<Path>>(path: P) -> Result<()> {
    let file = File::open(path.as_ref())?;
    verify_grouped_lines(BufReader::new(file)).map(|_| ())
}

/// Verify grouped order by buffering a reader (for stdin).
///
/// Validation consumes the stream, so the full input is buffered and
/// returned for the actual processing pass.
pub fn verify_grouped_reader<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    verify_grouped_lines(&buffer[..])?;
    Ok(buffer)
}

fn verify_grouped_lines<R: BufRead>(reader: R) -> Result<usize> {
    let mut validator = GroupValidator::new();
    let mut line_num = 0usize;

    for line in reader.split(b'\n') {
        let line = line?;
        line_num += 1;

        if should_skip_line(&line) || is_synthesized_line(&line) {
            continue;
        }

        let (film, dim) = parse_key_bytes(&line).ok_or_else(|| ReportError::Parse {
            line: line_num,
            message: "Expected film and dimension fields".to_string(),
        })?;
        let film = std::str::from_utf8(film).map_err(|_| ReportError::Parse {
            line: line_num,
            message: "Film field is not valid UTF-8".to_string(),
        })?;
        let dim = std::str::from_utf8(dim).map_err(|_| ReportError::Parse {
            line: line_num,
            message: "Dimension field is not valid UTF-8".to_string(),
        })?;

        validator.validate(film, dim)?;
    }

    Ok(validator.row_count())
}

/// Inline grouped-order validator for use within streaming loops.
///
/// Tracks every key whose run has closed; a closed key showing up again
/// is a grouping violation.
#[derive(Debug, Default)]
pub struct GroupValidator {
    current: Option<(String, String)>,
    closed: FxHashSet<(String, String)>,
    row_count: usize,
}

impl GroupValidator {
    /// Create a new grouped-order validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given key maintains grouped order.
    ///
    /// Returns Ok(()) if valid, Err if the key was seen in an earlier,
    /// already-closed run.
    #[inline]
    pub fn validate(&mut self, film: &str, dimension: &str) -> Result<()> {
        self.row_count += 1;

        match self.current {
            Some((ref f, ref d)) if f == film && d == dimension => {}
            Some(_) => {
                let prev = self.current.take();
                if self
                    .closed
                    .contains(&(film.to_string(), dimension.to_string()))
                {
                    return Err(ReportError::InvalidFormat(format!(
                        "Report not grouped: key '{} ({})' at row {} was seen earlier (equal keys must be contiguous)",
                        film, dimension, self.row_count
                    )));
                }
                if let Some(prev) = prev {
                    self.closed.insert(prev);
                }
                self.current = Some((film.to_string(), dimension.to_string()));
            }
            None => {
                self.current = Some((film.to_string(), dimension.to_string()));
            }
        }

        Ok(())
    }

    /// Reset validator state (for a new file).
    pub fn reset(&mut self) {
        self.current = None;
        self.closed.clear();
        self.row_count = 0;
    }

    /// Get the number of rows validated.
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}
