//! Command implementations for rollup-reports.

pub mod generate;
pub mod streaming_subtotal;
pub mod subtotal;
pub mod summary;

pub use crate::streaming::{verify_grouped, verify_grouped_reader, GroupValidator};
pub use generate::{GenerateCommand, GenerateStats};
pub use streaming_subtotal::{StreamingSubtotalCommand, SubtotalStats};
pub use subtotal::SubtotalCommand;
pub use summary::SummaryCommand;
