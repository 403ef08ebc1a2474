//! Streaming session report parser.
//!
//! Reports are tab-separated, one row per line:
//!
//! ```text
//! film <TAB> dimension <TAB> invitations <TAB> viewers <TAB> gross [<TAB> extra...]
//! ```
//!
//! Measure fields may carry digit-grouping separators (`1,234.50`),
//! which are stripped before parsing. Subtotal and grand-total rows are
//! recognized by their first-field marker and parsed as synthesized
//! rows, never as sessions.

use crate::config::strip_grouping;
use crate::streaming::parsing::parse_u64_grouped;
use crate::record::{
    GroupKey, Measures, ReportRow, ReportTotals, SessionRecord, SubtotalRecord,
    GRAND_TOTAL_MARKER, SUBTOTAL_MARKER,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading or aggregating a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid measure at line {line}: {field} is '{value}'")]
    Measure {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Invalid report format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// A streaming report reader.
pub struct ReportReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl ReportReader<File> {
    /// Open a report file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ReportReader<R> {
    /// Create a new report reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Create a report reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Line number of the most recently returned row.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next report row.
    pub fn read_row(&mut self) -> Result<Option<ReportRow>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            // Skip empty lines, comments, and the column header
            let line = self.buffer.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.starts_with('#') || line.starts_with("film\t") {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    /// Parse a single report line.
    fn parse_line(&self, line: &str) -> Result<ReportRow> {
        let fields: Vec<&str> = line.split('\t').collect();

        match fields[0] {
            SUBTOTAL_MARKER => self.parse_subtotal(&fields),
            GRAND_TOTAL_MARKER => self.parse_grand_total(&fields),
            _ => self.parse_session(&fields),
        }
    }

    fn parse_session(&self, fields: &[&str]) -> Result<ReportRow> {
        if fields.len() < 5 {
            return Err(ReportError::Parse {
                line: self.line_number,
                message: format!("Expected at least 5 fields, got {}", fields.len()),
            });
        }

        let film = fields[0].trim();
        let dimension = fields[1].trim();
        if film.is_empty() || dimension.is_empty() {
            return Err(ReportError::Parse {
                line: self.line_number,
                message: "Empty film or dimension field".to_string(),
            });
        }

        let measures = Measures {
            invitations: self.parse_count(fields[2], "invitations")?,
            viewers: self.parse_count(fields[3], "viewers")?,
            gross: self.parse_gross(fields[4])?,
        };

        let mut record = SessionRecord::new(film, dimension, measures);
        if fields.len() > 5 {
            record.extra_fields = fields[5..].iter().map(|s| s.to_string()).collect();
        }

        Ok(ReportRow::Session(record))
    }

    fn parse_subtotal(&self, fields: &[&str]) -> Result<ReportRow> {
        if fields.len() < 6 {
            return Err(ReportError::Parse {
                line: self.line_number,
                message: format!("Subtotal row needs 6 fields, got {}", fields.len()),
            });
        }

        let measures = Measures {
            invitations: self.parse_count(fields[3], "invitations")?,
            viewers: self.parse_count(fields[4], "viewers")?,
            gross: self.parse_gross(fields[5])?,
        };
        let sessions = if fields.len() > 6 {
            self.parse_count(fields[6], "sessions")? as usize
        } else {
            0
        };

        Ok(ReportRow::Subtotal(SubtotalRecord {
            key: GroupKey::new(fields[1], fields[2]),
            measures,
            sessions,
        }))
    }

    fn parse_grand_total(&self, fields: &[&str]) -> Result<ReportRow> {
        if fields.len() < 6 {
            return Err(ReportError::Parse {
                line: self.line_number,
                message: format!("Grand-total row needs 6 fields, got {}", fields.len()),
            });
        }

        let measures = Measures {
            invitations: self.parse_count(fields[3], "invitations")?,
            viewers: self.parse_count(fields[4], "viewers")?,
            gross: self.parse_gross(fields[5])?,
        };
        let sessions = if fields.len() > 6 {
            self.parse_count(fields[6], "sessions")? as usize
        } else {
            0
        };

        Ok(ReportRow::GrandTotal(ReportTotals { sessions, measures }))
    }

    fn parse_count(&self, s: &str, field: &'static str) -> Result<u64> {
        parse_u64_grouped(s.trim().as_bytes()).ok_or_else(|| ReportError::Measure {
            line: self.line_number,
            field,
            value: s.to_string(),
        })
    }

    fn parse_gross(&self, s: &str) -> Result<Decimal> {
        strip_grouping(s.trim())
            .parse()
            .map_err(|_| ReportError::Measure {
                line: self.line_number,
                field: "gross",
                value: s.to_string(),
            })
    }

    /// Get an iterator over all rows.
    pub fn rows(self) -> ReportRowIter<R> {
        ReportRowIter { reader: self }
    }
}

/// Iterator over report rows.
pub struct ReportRowIter<R: Read> {
    reader: ReportReader<R>,
}

impl<R: Read> Iterator for ReportRowIter<R> {
    type Item = Result<ReportRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read all rows from a report file.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<ReportRow>> {
    let reader = ReportReader::from_path(path)?;
    reader.rows().collect()
}

/// Read all session records from a report file.
///
/// Fails if the file contains synthesized rows: input to aggregation
/// must be detail-only, and re-aggregating a subtotal is an error.
pub fn read_sessions<P: AsRef<Path>>(path: P) -> Result<Vec<SessionRecord>> {
    let reader = ReportReader::from_path(path)?;
    let mut sessions = Vec::new();
    for result in reader.rows() {
        match result? {
            ReportRow::Session(rec) => sessions.push(rec),
            row => {
                return Err(ReportError::InvalidFormat(format!(
                    "Input already contains a synthesized row: '{}'",
                    row
                )))
            }
        }
    }
    Ok(sessions)
}

/// Parse rows from a string (useful for testing).
pub fn parse_rows(content: &str) -> Result<Vec<ReportRow>> {
    let reader = ReportReader::new(content.as_bytes());
    reader.rows().collect()
}

/// Parse session records from a string (useful for testing).
pub fn parse_sessions(content: &str) -> Result<Vec<SessionRecord>> {
    parse_rows(content)?
        .into_iter()
        .map(|row| match row {
            ReportRow::Session(rec) => Ok(rec),
            row => Err(ReportError::InvalidFormat(format!(
                "Input already contains a synthesized row: '{}'",
                row
            ))),
        })
        .collect()
}

/// Write rows to a writer.
pub fn write_rows<W: io::Write>(writer: &mut W, rows: &[ReportRow]) -> io::Result<()> {
    for row in rows {
        writeln!(writer, "{}", row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_session_row() {
        let content = "FilmX\t2D\t10\t100\t100.50\n";
        let sessions = parse_sessions(content).unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].film(), "FilmX");
        assert_eq!(sessions[0].dimension(), "2D");
        assert_eq!(sessions[0].measures.invitations, 10);
        assert_eq!(sessions[0].measures.viewers, 100);
        assert_eq!(sessions[0].measures.gross, dec("100.50"));
    }

    #[test]
    fn test_parse_grouped_digits() {
        // "1,234.50" parses to 1234.50 before summation
        let content = "FilmX\t2D\t1,000\t12,345\t1,234.50\n";
        let sessions = parse_sessions(content).unwrap();

        assert_eq!(sessions[0].measures.invitations, 1000);
        assert_eq!(sessions[0].measures.viewers, 12345);
        assert_eq!(sessions[0].measures.gross, dec("1234.50"));
    }

    #[test]
    fn test_parse_extra_fields_preserved() {
        let content = "FilmX\t2D\t10\t100\t100.50\tHall 3\t19:30\n";
        let sessions = parse_sessions(content).unwrap();

        assert_eq!(sessions[0].extra_fields, vec!["Hall 3", "19:30"]);
    }

    #[test]
    fn test_skip_comments_and_header() {
        let content = "# monthly report\nfilm\tdimension\tinvitations\tviewers\tgross\nFilmX\t2D\t10\t100\t100.50\n";
        let sessions = parse_sessions(content).unwrap();

        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_unparseable_measure_is_hard_error() {
        let content = "FilmX\t2D\t10\tN/A\t100.50\n";
        let result = parse_sessions(content);

        match result {
            Err(ReportError::Measure { line, field, value }) => {
                assert_eq!(line, 1);
                assert_eq!(field, "viewers");
                assert_eq!(value, "N/A");
            }
            other => panic!("Expected measure error, got {:?}", other),
        }
    }

    #[test]
    fn test_too_few_fields() {
        let content = "FilmX\t2D\t10\n";
        assert!(parse_sessions(content).is_err());
    }

    #[test]
    fn test_subtotal_row_round_trip() {
        let content = "subtotal\tFilmX\t2D\t15\t150\t150.75\n";
        let rows = parse_rows(content).unwrap();

        assert_eq!(rows.len(), 1);
        match &rows[0] {
            ReportRow::Subtotal(sub) => {
                assert_eq!(sub.key, GroupKey::new("FilmX", "2D"));
                assert_eq!(sub.measures.gross, dec("150.75"));
            }
            other => panic!("Expected subtotal, got {:?}", other),
        }
    }

    #[test]
    fn test_sessions_reject_synthesized_rows() {
        let content = "FilmX\t2D\t10\t100\t100.50\nsubtotal\tFilmX\t2D\t10\t100\t100.50\n";
        let result = parse_sessions(content);

        assert!(matches!(result, Err(ReportError::InvalidFormat(_))));
    }

    #[test]
    fn test_grand_total_row() {
        let content = "total\t\t\t13\t130\t130.25\n";
        let rows = parse_rows(content).unwrap();

        match &rows[0] {
            ReportRow::GrandTotal(totals) => {
                assert_eq!(totals.measures.invitations, 13);
                assert_eq!(totals.measures.gross, dec("130.25"));
            }
            other => panic!("Expected grand total, got {:?}", other),
        }
    }

    #[test]
    fn test_write_rows_round_trip() {
        let content = "FilmX\t2D\t10\t100\t100.50\tHall 3\n";
        let rows = parse_rows(content).unwrap();

        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), content);
    }
}
