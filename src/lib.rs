//! Rollup Reports: streaming subtotal toolkit for session reports.
//!
//! This library aggregates ordered box-office session records into
//! per-group subtotal rows in a single pass, without re-sorting.
//!
//! # Features
//!
//! - **Single-pass aggregation**: Subtotals from adjacency, O(n) time
//! - **Streaming I/O**: Memory-efficient processing of large reports
//! - **Exact money math**: Decimal gross sums, never binary floats
//!
//! # Example
//!
//! ```rust,no_run
//! use rollup_reports::{report, commands::SubtotalCommand};
//!
//! // Read an ordered session report
//! let sessions = report::read_sessions("report.tsv").unwrap();
//!
//! // Insert a subtotal row after each key run
//! let cmd = SubtotalCommand::new().with_grand_total(true);
//! let rows = cmd.aggregate(sessions);
//! ```

pub mod commands;
pub mod config;
pub mod record;
pub mod report;
pub mod streaming;

// Re-export commonly used types
pub use record::{GroupKey, Measures, ReportRow, ReportTotals, SessionRecord, SubtotalRecord};
pub use report::{parse_sessions, read_rows, read_sessions, ReportError, ReportReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{
        GenerateCommand, StreamingSubtotalCommand, SubtotalCommand, SummaryCommand,
    };
    pub use crate::record::{GroupKey, Measures, ReportRow, SessionRecord, SubtotalRecord};
    pub use crate::report::{parse_sessions, read_rows, read_sessions, ReportReader};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::commands::SubtotalCommand;
        use crate::report::parse_sessions;

        let content = "Dune\tIMAX\t2\t100\t1500.00\nDune\tIMAX\t0\t80\t1200.00\nNosferatu\t2D\t1\t40\t300.00\n";
        let sessions = parse_sessions(content).unwrap();

        let cmd = SubtotalCommand::new();
        let rows = cmd.aggregate(sessions);

        // 3 sessions and 2 subtotals
        assert_eq!(rows.len(), 5);
        assert!(rows[2].is_synthesized());
        assert!(rows[4].is_synthesized());
    }

    #[test]
    fn test_summary_workflow() {
        use crate::commands::SubtotalCommand;
        use crate::record::ReportRow;
        use crate::report::parse_sessions;

        let content = "Dune\tIMAX\t2\t100\t1500.00\nDune\t2D\t1\t40\t300.50\n";
        let sessions = parse_sessions(content).unwrap();

        let cmd = SubtotalCommand::new().with_grand_total(true);
        let rows = cmd.aggregate(sessions);

        let total = rows.last().unwrap();
        assert!(matches!(total, ReportRow::GrandTotal(_)));
        assert_eq!(total.measures().viewers, 140);
    }
}
