//! Efficient output formatting for streaming operations.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot
//! path. Gross amounts go through `Decimal`'s display impl, which emits
//! the raw numeric value; presentation-side grouping separators are
//! someone else's job.

use crate::record::{
    ReportRow, ReportTotals, SessionRecord, SubtotalRecord, GRAND_TOTAL_MARKER, SUBTOTAL_MARKER,
};
use crate::report::{ReportError, Result};
use std::io::{BufWriter, Write};

/// Buffer size for ReportWriter (256KB default).
const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// Buffered report output writer.
pub struct ReportWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> ReportWriter<W> {
    /// Create a new ReportWriter with the default buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    /// Create a new ReportWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a session row.
    pub fn write_session(&mut self, rec: &SessionRecord) -> Result<()> {
        self.write_str(&rec.key.film)?;
        self.write_tab()?;
        self.write_str(&rec.key.dimension)?;
        self.write_measures(rec)?;
        for field in &rec.extra_fields {
            self.write_tab()?;
            self.write_str(field)?;
        }
        self.write_newline()
    }

    /// Write a subtotal row, optionally with the run's session count.
    pub fn write_subtotal(&mut self, sub: &SubtotalRecord, with_count: bool) -> Result<()> {
        self.write_str(SUBTOTAL_MARKER)?;
        self.write_tab()?;
        self.write_str(&sub.key.film)?;
        self.write_tab()?;
        self.write_str(&sub.key.dimension)?;
        self.write_int(sub.measures.invitations)?;
        self.write_int(sub.measures.viewers)?;
        self.write_tab()?;
        write!(self.writer, "{}", sub.measures.gross).map_err(ReportError::Io)?;
        if with_count {
            self.write_int(sub.sessions)?;
        }
        self.write_newline()
    }

    /// Write a grand-total row.
    pub fn write_grand_total(&mut self, totals: &ReportTotals, with_count: bool) -> Result<()> {
        self.write_str(GRAND_TOTAL_MARKER)?;
        self.write_tab()?;
        self.write_tab()?;
        self.write_int(totals.measures.invitations)?;
        self.write_int(totals.measures.viewers)?;
        self.write_tab()?;
        write!(self.writer, "{}", totals.measures.gross).map_err(ReportError::Io)?;
        if with_count {
            self.write_int(totals.sessions)?;
        }
        self.write_newline()
    }

    /// Write any row.
    pub fn write_row(&mut self, row: &ReportRow, with_count: bool) -> Result<()> {
        match row {
            ReportRow::Session(rec) => self.write_session(rec),
            ReportRow::Subtotal(sub) => self.write_subtotal(sub, with_count),
            ReportRow::GrandTotal(totals) => self.write_grand_total(totals, with_count),
        }
    }

    fn write_measures(&mut self, rec: &SessionRecord) -> Result<()> {
        self.write_int(rec.measures.invitations)?;
        self.write_int(rec.measures.viewers)?;
        self.write_tab()?;
        write!(self.writer, "{}", rec.measures.gross).map_err(ReportError::Io)
    }

    /// Write a tab followed by an integer using itoa.
    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(b"\t").map_err(ReportError::Io)?;
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(ReportError::Io)
    }

    #[inline]
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.writer.write_all(s.as_bytes()).map_err(ReportError::Io)
    }

    #[inline]
    fn write_tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t").map_err(ReportError::Io)
    }

    #[inline]
    fn write_newline(&mut self) -> Result<()> {
        self.writer.write_all(b"\n").map_err(ReportError::Io)
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(ReportError::Io)
    }
}
