//! Summary command implementation.
//!
//! One pass computing whole-report totals: session count and the sum of
//! every measure, the numbers a report footer carries. Output is a
//! header row followed by a single values row.

use crate::record::{ReportRow, ReportTotals};
use crate::report::{ReportError, ReportReader, Result};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Summary command configuration.
#[derive(Debug, Clone, Default)]
pub struct SummaryCommand {
    /// Drop synthesized rows found in the input instead of failing
    pub skip_subtotals: bool,
}

impl SummaryCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop synthesized input rows instead of failing.
    pub fn with_skip_subtotals(mut self, skip: bool) -> Self {
        self.skip_subtotals = skip;
        self
    }

    /// Compute totals over a report stream.
    ///
    /// Synthesized rows are never summed; they either fail the call or
    /// are excluded, depending on `skip_subtotals`.
    pub fn totals<R: Read>(&self, reader: ReportReader<R>) -> Result<ReportTotals> {
        let mut totals = ReportTotals::default();

        for result in reader.rows() {
            match result? {
                ReportRow::Session(rec) => totals.add_session(&rec.measures),
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

        Ok(totals)
    }

    /// Execute the summary command on a report file.
    pub fn run<P: AsRef<Path>, W: Write>(&self, input: P, output: &mut W) -> Result<()> {
        let file = File::open(input.as_ref())?;
        let reader = ReportReader::with_capacity(file, 64 * 1024);
        let totals = self.totals(reader)?;
        self.write_totals(&totals, output)
    }

    /// Execute the summary command from stdin.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<()> {
        let stdin = io::stdin();
        let reader = ReportReader::new(stdin.lock());
        let totals = self.totals(reader)?;
        self.write_totals(&totals, output)
    }

    fn write_totals<W: Write>(&self, totals: &ReportTotals, output: &mut W) -> Result<()> {
        writeln!(output, "sessions\tinvitations\tviewers\tgross").map_err(ReportError::Io)?;
        writeln!(output, "{}\t{}", totals.sessions, totals.measures).map_err(ReportError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_summary_totals() {
        let content = "FilmX\t2D\t10\t100\t100.50\nFilmY\t3D\t3\t30\t30.25\n";
        let cmd = SummaryCommand::new();
        let totals = cmd.totals(ReportReader::new(content.as_bytes())).unwrap();

        assert_eq!(totals.sessions, 2);
        assert_eq!(totals.measures.invitations, 13);
        assert_eq!(totals.measures.viewers, 130);
        assert_eq!(totals.measures.gross, Decimal::from_str("130.75").unwrap());
    }

    #[test]
    fn test_summary_output_format() {
        let content = "FilmX\t2D\t10\t100\t100.50\n";
        let cmd = SummaryCommand::new();
        let mut output = Vec::new();

        let totals = cmd.totals(ReportReader::new(content.as_bytes())).unwrap();
        cmd.write_totals(&totals, &mut output).unwrap();

        let result = String::from_utf8(output).unwrap();
        assert_eq!(
            result,
            "sessions\tinvitations\tviewers\tgross\n1\t10\t100\t100.50\n"
        );
    }

    #[test]
    fn test_summary_empty_report() {
        let cmd = SummaryCommand::new();
        let totals = cmd.totals(ReportReader::new(&b""[..])).unwrap();

        assert_eq!(totals.sessions, 0);
        assert!(totals.measures.is_zero());
    }

    #[test]
    fn test_summary_rejects_subtotal_rows() {
        let content = "FilmX\t2D\t10\t100\t100\nsubtotal\tFilmX\t2D\t10\t100\t100\n";
        let cmd = SummaryCommand::new();
        let result = cmd.totals(ReportReader::new(content.as_bytes()));

        assert!(matches!(result, Err(ReportError::InvalidFormat(_))));
    }

    #[test]
    fn test_summary_skip_subtotals() {
        let content = "FilmX\t2D\t10\t100\t100\nsubtotal\tFilmX\t2D\t10\t100\t100\n";
        let cmd = SummaryCommand::new().with_skip_subtotals(true);
        let totals = cmd.totals(ReportReader::new(content.as_bytes())).unwrap();

        assert_eq!(totals.sessions, 1);
        assert_eq!(totals.measures.viewers, 100);
    }
}
