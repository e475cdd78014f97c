//! Pagination parameter clamping

/// Default rows per page when the caller gives none
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard upper bound on rows per page
pub const MAX_PAGE_SIZE: i64 = 200;

/// Sanitized pagination derived from raw query parameters
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page, in [1, MAX_PAGE_SIZE]
    pub page_size: i64,
    /// Offset for SQL LIMIT/OFFSET
    pub offset: i64,
}

/// Clamp raw page/page_size into valid bounds.
///
/// Page numbers below 1 become 1; page sizes are forced into
/// [1, MAX_PAGE_SIZE] with the default applied when absent.
pub fn clamp(page: Option<i64>, page_size: Option<i64>) -> Pagination {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    Pagination {
        page,
        page_size,
        offset: (page - 1) * page_size,
    }
}

/// Rank of the item at `index` on the given page
pub fn rank(pagination: &Pagination, index: usize) -> i64 {
    (pagination.page - 1) * pagination.page_size + index as i64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = clamp(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_page_size_capped() {
        let p = clamp(Some(2), Some(500));
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
        assert_eq!(p.offset, 200);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let p = clamp(Some(0), Some(0));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
        let p = clamp(Some(-5), Some(-5));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
    }

    #[test]
    fn test_rank_formula() {
        let p = clamp(Some(3), Some(20));
        assert_eq!(rank(&p, 0), 41);
        assert_eq!(rank(&p, 19), 60);
    }
}
