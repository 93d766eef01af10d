//! Page recovery for listing endpoints.
//!
//! A requested page never fails a request: malformed or too-small numbers fall
//! back to the first page and numbers past the end land on the last page.

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Positive integer from a query value. Digit strings too large for `u64`
/// saturate instead of being treated as garbage.
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    match raw?.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
        Err(_) => None,
    }
}

/// Raw page number as it arrived on the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedPage {
    /// Parameter absent, non-numeric, or below 1.
    First,
    Number(u64),
}

impl RequestedPage {
    pub fn parse(raw: Option<&str>) -> Self {
        parse_positive(raw).map_or(RequestedPage::First, RequestedPage::Number)
    }

    /// Clamps onto `1..=total_pages`.
    pub fn resolve(self, total_pages: u32) -> u32 {
        let last = total_pages.max(1);
        match self {
            RequestedPage::First => 1,
            RequestedPage::Number(n) => {
                u32::try_from(n).map_or(last, |n| n.min(last))
            }
        }
    }
}

/// Query-string controls shared by every paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: RequestedPage,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: RequestedPage::First,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page_size = parse_positive(page_size).map_or(DEFAULT_PAGE_SIZE, |n| {
            u32::try_from(n).map_or(MAX_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE))
        });
        Self {
            page: RequestedPage::parse(page),
            page_size,
        }
    }

    /// Resolves the request against a known result count.
    pub fn window(&self, count: u64) -> PageWindow {
        let size = u64::from(self.page_size);
        let total_pages = count.div_ceil(size).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        let page = self.page.resolve(total_pages);
        PageWindow {
            page,
            page_size: self.page_size,
            total_pages,
            count,
        }
    }
}

/// A resolved page: which slice of the result set to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub count: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Applies the window to an already materialized result set.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        items.iter().skip(start).take(limit).cloned().collect()
    }
}

/// Paged response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, results: Vec<T>) -> Self {
        Self {
            count: window.count,
            page: window.page,
            page_size: window.page_size,
            total_pages: window.total_pages,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_past_the_end_lands_on_last_page() {
        let request = PageRequest::from_raw(Some("9999"), Some("10"));
        let window = request.window(25);
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.page, 3);
        assert_eq!(window.offset(), 20);
    }

    #[test]
    fn oversized_numbers_saturate() {
        let huge = "99999999999999999999";
        let window = PageRequest::from_raw(Some(huge), None).window(25);
        assert_eq!(window.page, 3);

        let request = PageRequest::from_raw(None, Some(huge));
        assert_eq!(request.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn malformed_or_small_page_falls_back_to_first() {
        for raw in ["abc", "0", "-4", "", "2.5", "-99999999999999999999"] {
            let window = PageRequest::from_raw(Some(raw), None).window(25);
            assert_eq!(window.page, 1, "page={raw:?}");
        }
    }

    #[test]
    fn valid_page_is_kept() {
        let window = PageRequest::from_raw(Some("2"), None).window(25);
        assert_eq!(window.page, 2);
    }

    #[test]
    fn empty_set_has_one_empty_page() {
        let window = PageRequest::from_raw(Some("5"), None).window(0);
        assert_eq!(window.total_pages, 1);
        assert_eq!(window.page, 1);
        let page = Page::new(window, window.slice::<u32>(&[]));
        assert!(page.results.is_empty());
    }

    #[test]
    fn page_size_defaults_and_caps() {
        assert_eq!(PageRequest::from_raw(None, Some("x")).page_size, 10);
        assert_eq!(PageRequest::from_raw(None, Some("0")).page_size, 10);
        assert_eq!(PageRequest::from_raw(None, Some("500")).page_size, 100);
        assert_eq!(PageRequest::from_raw(None, Some("25")).page_size, 25);
    }

    #[test]
    fn slice_takes_the_window() {
        let items: Vec<u32> = (1..=25).collect();
        let window = PageRequest::from_raw(Some("3"), None).window(25);
        assert_eq!(window.slice(&items), vec![21, 22, 23, 24, 25]);
    }
}
