//! Centralized streaming utilities for Rollup.
//!
//! Shared components for the streaming commands:
//! - Zero-allocation row field parsing
//! - Grouped-order validation
//! - Efficient output formatting
//!
//! The streaming subtotal pass maintains O(1) memory: only the active
//! run's key and accumulators are held at any time.

pub mod output;
pub mod parsing;
pub mod validation;

pub use output::ReportWriter;
pub use parsing::{is_synthesized_line, parse_key_bytes, parse_u64_grouped, should_skip_line};
pub use validation::{verify_grouped, verify_grouped_reader, GroupValidator};
