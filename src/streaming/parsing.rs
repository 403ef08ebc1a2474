//! Zero-allocation row parsing utilities.
//!
//! These functions provide high-performance parsing of report rows
//! without any heap allocation in the hot path.

use crate::config::is_space_grouping;
use memchr::memchr;

/// Fast u64 parsing that skips digit-grouping separators.
///
/// Commas are always skipped; ASCII space and U+00A0 (the two-byte
/// sequence `0xC2 0xA0`) are skipped as well when space grouping is
/// enabled. Returns None if no digit is present or a non-digit,
/// non-separator byte is found.
#[inline(always)]
pub fn parse_u64_grouped(bytes: &[u8]) -> Option<u64> {
    let spaces = is_space_grouping();
    let mut n: u64 = 0;
    let mut digits = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let d = b.wrapping_sub(b'0');
        if d <= 9 {
            n = n.checked_mul(10)?.checked_add(d as u64)?;
            digits += 1;
            i += 1;
        } else if b == b',' {
            i += 1;
        } else if spaces && b == b' ' {
            i += 1;
        } else if spaces && b == 0xC2 && bytes.get(i + 1) == Some(&0xA0) {
            i += 2;
        } else {
            return None;
        }
    }

    if digits == 0 {
        None
    } else {
        Some(n)
    }
}

/// Parse the composite key fields of a row using memchr - zero allocation.
///
/// Returns (film_bytes, dimension_bytes) or None if the row has fewer
/// than two fields. Trailing line endings on the dimension field are
/// trimmed.
#[inline(always)]
pub fn parse_key_bytes(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let tab1 = memchr(b'\t', line)?;
    let film = &line[..tab1];

    let rest = &line[tab1 + 1..];
    let dim_len = memchr(b'\t', rest).unwrap_or(rest.len());
    let mut dim = &rest[..dim_len];
    while let [head @ .., b'\r' | b'\n'] = dim {
        dim = head;
    }

    if film.is_empty() || dim.is_empty() {
        return None;
    }
    Some((film, dim))
}

/// Check if a line should be skipped (empty, comment, or column header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace()) || line[0] == b'#' || line.starts_with(b"film\t")
}

/// Check if a line is a synthesized row (subtotal or grand total).
#[inline(always)]
pub fn is_synthesized_line(line: &[u8]) -> bool {
    line.starts_with(b"subtotal\t") || line.starts_with(b"total\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::set_space_grouping;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_parse_u64_grouped() {
        set_space_grouping(false);
        assert_eq!(parse_u64_grouped(b"12345"), Some(12345));
        assert_eq!(parse_u64_grouped(b"1,234"), Some(1234));
        assert_eq!(parse_u64_grouped(b"0"), Some(0));
        assert_eq!(parse_u64_grouped(b""), None);
        assert_eq!(parse_u64_grouped(b","), None); // Separators but no digits
        assert_eq!(parse_u64_grouped(b"N/A"), None);
        assert_eq!(parse_u64_grouped(b"123abc"), None);
        assert_eq!(parse_u64_grouped(b"1 234"), None); // Spaces off by default
    }

    #[test]
    #[serial]
    fn test_parse_u64_space_grouping() {
        set_space_grouping(true);
        assert_eq!(parse_u64_grouped(b"1 234"), Some(1234));
        assert_eq!(parse_u64_grouped("1\u{a0}234".as_bytes()), Some(1234));
        set_space_grouping(false); // Reset
    }

    #[test]
    #[serial]
    fn test_parse_u64_overflow() {
        set_space_grouping(false);
        assert_eq!(parse_u64_grouped(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_grouped(b"18446744073709551616"), None);
    }

    #[test]
    fn test_parse_key_bytes() {
        assert_eq!(
            parse_key_bytes(b"FilmX\t2D\t10\t100\t100.50"),
            Some((&b"FilmX"[..], &b"2D"[..]))
        );
        assert_eq!(
            parse_key_bytes(b"FilmX\t2D\n"),
            Some((&b"FilmX"[..], &b"2D"[..]))
        );
        assert_eq!(parse_key_bytes(b"FilmX"), None);
        assert_eq!(parse_key_bytes(b""), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"   \n"));
        assert!(should_skip_line(b"# comment"));
        assert!(should_skip_line(b"film\tdimension\tinvitations"));
        assert!(!should_skip_line(b"FilmX\t2D\t10\t100\t100.50"));
    }

    #[test]
    fn test_is_synthesized_line() {
        assert!(is_synthesized_line(b"subtotal\tFilmX\t2D\t15\t150\t150.75"));
        assert!(is_synthesized_line(b"total\t\t\t13\t130\t130"));
        assert!(!is_synthesized_line(b"FilmX\t2D\t10\t100\t100.50"));
        assert!(!is_synthesized_line(b"totally a film\t2D\t1\t2\t3"));
    }
}
