//! # Paginator
//!
//! Page number and page size from request parameters. Pagination is
//! best-effort: unparsable values fall back to defaults, never to errors.

use serde::Serialize;

use super::params::{RawParams, LIMIT_KEY, PAGE_KEY};

/// Page size when none is requested
pub const DEFAULT_LIMIT: u64 = 100;

/// Largest page size served
pub const MAX_LIMIT: u64 = 100;

/// First page
pub const DEFAULT_PAGE: u64 = 1;

/// A bounded page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    /// 1-based page number
    pub page: u64,
    /// Page size, within [1, MAX_LIMIT]
    pub limit: u64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageSpec {
    /// Documents to skip before this page
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Derive the page request from raw parameters.
///
/// A missing, non-numeric or zero value takes the default. Negative values
/// clamp to 1; a limit above `MAX_LIMIT` clamps to `MAX_LIMIT`.
pub fn paginate(raw: &RawParams) -> PageSpec {
    let page = match raw.get_str(PAGE_KEY).and_then(parse_int_prefix) {
        None | Some(0) => DEFAULT_PAGE,
        Some(n) => n.max(1) as u64,
    };

    let limit = match raw.get_str(LIMIT_KEY).and_then(parse_int_prefix) {
        None | Some(0) => DEFAULT_LIMIT,
        Some(n) => n.max(1) as u64,
    };

    PageSpec {
        page,
        limit: limit.min(MAX_LIMIT),
    }
}

/// Parse a leading base-10 integer: `" 12abc"` -> 12, `"3.7"` -> 3, `"abc"` -> None.
/// Values beyond `i64` saturate.
fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value = digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(pairs: &[(&str, &str)]) -> PageSpec {
        paginate(&RawParams::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let spec = page_of(&[]);
        assert_eq!(spec, PageSpec { page: 1, limit: 100 });
        assert_eq!(spec.skip(), 0);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(page_of(&[("limit", "500")]).limit, 100);
    }

    #[test]
    fn test_non_numeric_falls_back() {
        assert_eq!(page_of(&[("limit", "abc")]).limit, 100);
        assert_eq!(page_of(&[("page", "abc")]).page, 1);
    }

    #[test]
    fn test_zero_falls_back() {
        assert_eq!(page_of(&[("page", "0")]).page, 1);
        assert_eq!(page_of(&[("limit", "0")]).limit, 100);
    }

    #[test]
    fn test_negative_clamps_to_one() {
        assert_eq!(page_of(&[("page", "-3")]).page, 1);
        assert_eq!(page_of(&[("limit", "-5")]).limit, 1);
    }

    #[test]
    fn test_integer_prefix() {
        assert_eq!(page_of(&[("page", "3.7")]).page, 3);
        assert_eq!(page_of(&[("limit", " 12abc")]).limit, 12);
    }

    #[test]
    fn test_skip() {
        let spec = page_of(&[("page", "3"), ("limit", "20")]);
        assert_eq!(spec.skip(), 40);
    }

    #[test]
    fn test_huge_page_saturates() {
        let spec = page_of(&[("page", "99999999999999999999999")]);
        assert_eq!(spec.page, i64::MAX as u64);
        assert_eq!(spec.skip(), u64::MAX);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("+7"), Some(7));
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix(""), None);
    }
}
