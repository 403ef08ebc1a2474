//! Global configuration for Rollup runtime behavior.
//!
//! This module provides thread-safe global configuration that affects
//! measure parsing without adding overhead to hot loops.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag for space-style digit grouping.
///
/// Commas are always treated as digit-grouping separators in measure
/// fields. When this flag is enabled, ASCII space and U+00A0 are
/// stripped as well, for reports printed with `1 234,50`-style locales.
///
/// This is set once at startup and read during parsing. The atomic load
/// has negligible overhead compared to the actual parsing work.
static SPACE_GROUPING: AtomicBool = AtomicBool::new(false);

/// Enable space-style digit grouping.
///
/// # Example
///
/// ```
/// use rollup_reports::config;
///
/// // Enable at startup before any parsing
/// config::set_space_grouping(true);
///
/// // Now measure parsing will also strip spaces
/// // "1 234" -> 1234
/// ```
#[inline]
pub fn set_space_grouping(enabled: bool) {
    SPACE_GROUPING.store(enabled, Ordering::Release);
}

/// Check if space-style digit grouping is enabled.
#[inline]
pub fn is_space_grouping() -> bool {
    SPACE_GROUPING.load(Ordering::Acquire)
}

/// Strip digit-grouping separators from a measure field.
///
/// Returns the input unchanged (borrowed) when no separator is present,
/// which is the common case. This should be called during parsing, not
/// in inner loops.
#[inline]
pub fn strip_grouping(s: &str) -> Cow<'_, str> {
    let spaces = is_space_grouping();
    let is_sep = |c: char| c == ',' || (spaces && (c == ' ' || c == '\u{a0}'));

    if s.chars().any(is_sep) {
        Cow::Owned(s.chars().filter(|&c| !is_sep(c)).collect())
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_comma_only() {
        set_space_grouping(false);
        assert!(!is_space_grouping());
        assert_eq!(strip_grouping("1,234.50"), "1234.50");
        assert_eq!(strip_grouping("1 234"), "1 234"); // Space untouched
    }

    #[test]
    #[serial]
    fn test_space_grouping_mode() {
        set_space_grouping(true);
        assert!(is_space_grouping());
        assert_eq!(strip_grouping("1 234,50"), "123450"); // Comma is still grouping
        assert_eq!(strip_grouping("1\u{a0}234"), "1234");
        set_space_grouping(false); // Reset
    }

    #[test]
    #[serial]
    fn test_no_separator_borrows() {
        set_space_grouping(false);
        assert!(matches!(
            strip_grouping("1234.50"),
            std::borrow::Cow::Borrowed(_)
        ));
    }
}
