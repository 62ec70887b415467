//! Page-number pagination: request validation, store window calculation,
//! and result assembly.
//!
//! Requests are 1-indexed pages of a bounded size. The store is always asked
//! for exactly one window (`LIMIT`/`OFFSET`), and the total row count is used
//! afterwards to derive page metadata. Asking for a page past the end is not
//! an error; it simply yields no items.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Hard ceiling on page size. Configuration may lower it, never raise it.
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// PageRequest
// ---------------------------------------------------------------------------

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate a page request.
    ///
    /// `page` must be at least 1 and `page_size` within `1..=max_page_size`.
    pub fn new(page: u32, page_size: u32, max_page_size: u32) -> Result<Self, CoreError> {
        if page < 1 {
            return Err(CoreError::Validation("page must be at least 1".to_string()));
        }
        if page_size < 1 || page_size > max_page_size {
            return Err(CoreError::Validation(format!(
                "page_size must be between 1 and {max_page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Build a request from optional query values, applying defaults first.
    pub fn from_params(
        page: Option<u32>,
        page_size: Option<u32>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Result<Self, CoreError> {
        Self::new(
            page.unwrap_or(1),
            page_size.unwrap_or(default_page_size),
            max_page_size,
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    /// Number of rows to fetch.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// `ceil(total_items / page_size)`; zero when there are no items.
///
/// Negative counts are treated as zero.
pub fn total_pages(total_items: i64, page_size: u32) -> i64 {
    let total_items = total_items.max(0);
    let page_size = i64::from(page_size.max(1));
    (total_items + page_size - 1) / page_size
}

// ---------------------------------------------------------------------------
// PageResult
// ---------------------------------------------------------------------------

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> PageResult<T> {
    /// Map fetched rows into their public representation and attach metadata.
    ///
    /// Never returns more than `page_size` items, and returns none when
    /// `total_items` is zero.
    pub fn assemble<R>(rows: Vec<R>, request: &PageRequest, total_items: i64) -> Self
    where
        R: Into<T>,
    {
        let total_items = total_items.max(0);
        let items = if total_items == 0 {
            Vec::new()
        } else {
            rows.into_iter()
                .take(request.page_size() as usize)
                .map(Into::into)
                .collect()
        };

        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total_items,
            total_pages: total_pages(total_items, request.page_size()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // -- PageRequest ---------------------------------------------------------

    #[test]
    fn offset_is_zero_on_first_page() {
        let req = PageRequest::new(1, 20, MAX_PAGE_SIZE).unwrap();
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn offset_follows_page_and_size() {
        let req = PageRequest::new(3, 25, MAX_PAGE_SIZE).unwrap();
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn offset_does_not_overflow_at_extremes() {
        let req = PageRequest::new(u32::MAX, MAX_PAGE_SIZE, MAX_PAGE_SIZE).unwrap();
        assert_eq!(
            req.offset(),
            (i64::from(u32::MAX) - 1) * i64::from(MAX_PAGE_SIZE)
        );
    }

    #[test]
    fn page_zero_is_rejected() {
        assert_matches!(
            PageRequest::new(0, 20, MAX_PAGE_SIZE),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn page_size_zero_is_rejected() {
        assert_matches!(
            PageRequest::new(1, 0, MAX_PAGE_SIZE),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn page_size_above_max_is_rejected() {
        assert_matches!(
            PageRequest::new(1, 101, MAX_PAGE_SIZE),
            Err(CoreError::Validation(msg)) if msg.contains("100")
        );
        assert!(PageRequest::new(1, 100, MAX_PAGE_SIZE).is_ok());
    }

    #[test]
    fn configured_max_is_respected() {
        assert!(PageRequest::new(1, 50, 25).is_err());
        assert!(PageRequest::new(1, 25, 25).is_ok());
    }

    #[test]
    fn from_params_applies_defaults() {
        let req = PageRequest::from_params(None, None, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), DEFAULT_PAGE_SIZE);
    }

    // -- total_pages ---------------------------------------------------------

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(3, 2), 2);
    }

    #[test]
    fn total_pages_matches_float_ceiling_across_range() {
        for page_size in 1..=MAX_PAGE_SIZE {
            for total in 0..=250_i64 {
                let expected = (total as f64 / f64::from(page_size)).ceil() as i64;
                assert_eq!(total_pages(total, page_size), expected);
            }
        }
    }

    #[test]
    fn total_pages_clamps_negative_count() {
        assert_eq!(total_pages(-5, 10), 0);
    }

    // -- PageResult::assemble ------------------------------------------------

    #[test]
    fn assemble_attaches_metadata() {
        let req = PageRequest::new(2, 2, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble(vec![3_i64], &req, 3);
        assert_eq!(result.items, vec![3]);
        assert_eq!(result.page, 2);
        assert_eq!(result.page_size, 2);
        assert_eq!(result.total_items, 3);
        assert_eq!(result.total_pages, 2);
    }

    #[test]
    fn assemble_with_zero_total_has_no_items() {
        let req = PageRequest::new(1, 10, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble(vec![1_i64, 2], &req, 0);
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 0);
    }

    #[test]
    fn assemble_never_exceeds_page_size() {
        let req = PageRequest::new(1, 2, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble(vec![1_i64, 2, 3, 4], &req, 4);
        assert_eq!(result.items.len(), 2);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let req = PageRequest::new(9, 10, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble(Vec::<i64>::new(), &req, 15);
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.page, 9);
    }

    #[test]
    fn rederiving_total_pages_is_idempotent() {
        let req = PageRequest::new(1, 7, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble((1..=7).collect(), &req, 44);
        assert_eq!(
            total_pages(result.total_items, result.page_size),
            result.total_pages
        );
    }

    #[test]
    fn assemble_is_deterministic() {
        let req = PageRequest::new(1, 3, MAX_PAGE_SIZE).unwrap();
        let a: PageResult<i64> = PageResult::assemble(vec![1_i64, 2, 3], &req, 9);
        let b: PageResult<i64> = PageResult::assemble(vec![1_i64, 2, 3], &req, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let req = PageRequest::new(1, 5, MAX_PAGE_SIZE).unwrap();
        let result: PageResult<i64> = PageResult::assemble(vec![1_i64], &req, 1);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["page_size"], 5);
        assert_eq!(json["total_items"], 1);
        assert_eq!(json["total_pages"], 1);
    }
}
