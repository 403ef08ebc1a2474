//! Core row types for session report representation.

use rust_decimal::Decimal;
use std::fmt;

/// Wire marker identifying a subtotal row (first field).
pub const SUBTOTAL_MARKER: &str = "subtotal";

/// Wire marker identifying a grand-total row (first field).
pub const GRAND_TOTAL_MARKER: &str = "total";

/// Composite grouping key for a session row.
/// Two rows belong to the same run iff both components compare equal
/// against the immediately preceding row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub film: String,
    pub dimension: String,
}

impl GroupKey {
    /// Create a new group key.
    #[inline]
    pub fn new(film: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            film: film.into(),
            dimension: dimension.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.film, self.dimension)
    }
}

/// The numeric quantities summed across a run.
///
/// Attendance counts use exact integer addition; gross yield is a
/// `Decimal` so monetary sums never accumulate binary-float error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measures {
    pub invitations: u64,
    pub viewers: u64,
    pub gross: Decimal,
}

impl Measures {
    pub const ZERO: Self = Self {
        invitations: 0,
        viewers: 0,
        gross: Decimal::ZERO,
    };

    /// Create a new measure set.
    #[inline]
    pub fn new(invitations: u64, viewers: u64, gross: Decimal) -> Self {
        Self {
            invitations,
            viewers,
            gross,
        }
    }

    /// Add another measure set into this one.
    ///
    /// Count sums saturate at `u64::MAX` rather than wrapping; parsing
    /// already bounds each field, so only a pathological report can
    /// reach the cap.
    #[inline]
    pub fn add(&mut self, other: &Measures) {
        self.invitations = self.invitations.saturating_add(other.invitations);
        self.viewers = self.viewers.saturating_add(other.viewers);
        self.gross += other.gross;
    }

    /// Returns true if every measure is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.invitations == 0 && self.viewers == 0 && self.gross.is_zero()
    }
}

impl Default for Measures {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Measures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.invitations, self.viewers, self.gross)
    }
}

/// One detail row of the report: a single screening session.
///
/// Trailing report columns beyond the measures (hall, start time, ...)
/// are preserved verbatim in `extra_fields` and never participate in
/// aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub key: GroupKey,
    pub measures: Measures,
    /// Additional fields beyond the measure columns
    pub extra_fields: Vec<String>,
}

impl SessionRecord {
    /// Create a session record with no extra columns.
    pub fn new(
        film: impl Into<String>,
        dimension: impl Into<String>,
        measures: Measures,
    ) -> Self {
        Self {
            key: GroupKey::new(film, dimension),
            measures,
            extra_fields: Vec::new(),
        }
    }

    /// Get the film component of the key.
    #[inline]
    pub fn film(&self) -> &str {
        &self.key.film
    }

    /// Get the dimension component of the key.
    #[inline]
    pub fn dimension(&self) -> &str {
        &self.key.dimension
    }
}

impl fmt::Display for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.key, self.measures)?;
        for field in &self.extra_fields {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

/// A synthesized subtotal row summarizing one maximal run.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtotalRecord {
    pub key: GroupKey,
    pub measures: Measures,
    /// Number of sessions in the run
    pub sessions: usize,
}

impl fmt::Display for SubtotalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", SUBTOTAL_MARKER, self.key, self.measures)
    }
}

/// Grand totals across an entire report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportTotals {
    pub sessions: usize,
    pub measures: Measures,
}

impl ReportTotals {
    /// Fold one session into the totals.
    #[inline]
    pub fn add_session(&mut self, measures: &Measures) {
        self.sessions += 1;
        self.measures.add(measures);
    }
}

impl fmt::Display for ReportTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t\t\t{}", GRAND_TOTAL_MARKER, self.measures)
    }
}

/// One row of an aggregated output sequence.
///
/// Synthesized rows carry a distinct marker on the wire so a later
/// aggregation pass can recognize and refuse (or exclude) them instead
/// of summing them into a further subtotal.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Session(SessionRecord),
    Subtotal(SubtotalRecord),
    GrandTotal(ReportTotals),
}

impl ReportRow {
    /// Returns true for synthesized rows (subtotal or grand total).
    #[inline]
    pub fn is_synthesized(&self) -> bool {
        !matches!(self, ReportRow::Session(_))
    }

    /// The group key, if the row carries one.
    pub fn key(&self) -> Option<&GroupKey> {
        match self {
            ReportRow::Session(rec) => Some(&rec.key),
            ReportRow::Subtotal(sub) => Some(&sub.key),
            ReportRow::GrandTotal(_) => None,
        }
    }

    /// The row's measures.
    pub fn measures(&self) -> &Measures {
        match self {
            ReportRow::Session(rec) => &rec.measures,
            ReportRow::Subtotal(sub) => &sub.measures,
            ReportRow::GrandTotal(totals) => &totals.measures,
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportRow::Session(rec) => write!(f, "{}", rec),
            ReportRow::Subtotal(sub) => write!(f, "{}", sub),
            ReportRow::GrandTotal(totals) => write!(f, "{}", totals),
        }
    }
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
    fn test_key_equality() {
        let a = GroupKey::new("FilmX", "2D");
        let b = GroupKey::new("FilmX", "2D");
        let c = GroupKey::new("FilmX", "3D");
        let d = GroupKey::new("FilmY", "2D");

        assert_eq!(a, b);
        assert_ne!(a, c); // Same film, different dimension
        assert_ne!(a, d); // Different film, same dimension
    }

    #[test]
    fn test_measures_add() {
        let mut acc = Measures::ZERO;
        acc.add(&Measures::new(10, 100, dec("100.50")));
        acc.add(&Measures::new(5, 50, dec("50.25")));

        assert_eq!(acc.invitations, 15);
        assert_eq!(acc.viewers, 150);
        assert_eq!(acc.gross, dec("150.75"));
    }

    #[test]
    fn test_measures_add_saturates() {
        let mut acc = Measures::new(u64::MAX - 1, u64::MAX, Decimal::ZERO);
        acc.add(&Measures::new(5, 5, Decimal::ZERO));

        assert_eq!(acc.invitations, u64::MAX);
        assert_eq!(acc.viewers, u64::MAX);
    }

    #[test]
    fn test_measures_decimal_precision() {
        // 0.1 repeated must stay exact, unlike f64
        let mut acc = Measures::ZERO;
        for _ in 0..10 {
            acc.add(&Measures::new(0, 0, dec("0.10")));
        }
        assert_eq!(acc.gross, dec("1.00"));
    }

    #[test]
    fn test_session_display() {
        let rec = SessionRecord::new("FilmX", "2D", Measures::new(10, 100, dec("100.50")));
        assert_eq!(rec.to_string(), "FilmX\t2D\t10\t100\t100.50");
    }

    #[test]
    fn test_session_display_with_extras() {
        let mut rec = SessionRecord::new("FilmX", "2D", Measures::new(10, 100, dec("100.50")));
        rec.extra_fields = vec!["Hall 3".to_string(), "19:30".to_string()];
        assert_eq!(rec.to_string(), "FilmX\t2D\t10\t100\t100.50\tHall 3\t19:30");
    }

    #[test]
    fn test_subtotal_display_carries_marker() {
        let sub = SubtotalRecord {
            key: GroupKey::new("FilmX", "2D"),
            measures: Measures::new(15, 150, dec("150.75")),
            sessions: 2,
        };
        assert_eq!(sub.to_string(), "subtotal\tFilmX\t2D\t15\t150\t150.75");
    }

    #[test]
    fn test_report_totals() {
        let mut totals = ReportTotals::default();
        totals.add_session(&Measures::new(10, 100, dec("100")));
        totals.add_session(&Measures::new(3, 30, dec("30")));

        assert_eq!(totals.sessions, 2);
        assert_eq!(totals.measures.viewers, 130);
        assert_eq!(totals.to_string(), "total\t\t\t13\t130\t130");
    }

    #[test]
    fn test_row_is_synthesized() {
        let rec = ReportRow::Session(SessionRecord::new("FilmX", "2D", Measures::ZERO));
        let sub = ReportRow::Subtotal(SubtotalRecord {
            key: GroupKey::new("FilmX", "2D"),
            measures: Measures::ZERO,
            sessions: 0,
        });

        assert!(!rec.is_synthesized());
        assert!(sub.is_synthesized());
    }
}
