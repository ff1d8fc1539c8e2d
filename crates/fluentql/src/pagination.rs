//! Page arithmetic and the page returned by `paginate`.

use serde::Serialize;

/// Position of one page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
    pub total_count: u64,
    pub page_count: u64,
    pub previous: Option<u64>,
    pub next: Option<u64>,
}

impl PageWindow {
    /// Compute the window for `page` (1-based). Both `page` and `per_page` are
    /// raised to at least 1.
    pub fn compute(total_count: u64, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let page_count = total_count.div_ceil(per_page);
        Self {
            page,
            per_page,
            total_count,
            page_count,
            previous: (page > 1).then(|| page - 1),
            next: (page < page_count).then(|| page + 1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// One page of rows plus its window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub window: PageWindow,
}

impl<T> Page<T> {
    pub fn total_count(&self) -> u64 {
        self.window.total_count
    }

    pub fn page_count(&self) -> u64 {
        self.window.page_count
    }

    pub fn previous(&self) -> Option<u64> {
        self.window.previous
    }

    pub fn next(&self) -> Option<u64> {
        self.window.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last_page() {
        let first = PageWindow::compute(45, 1, 20);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.previous, None);
        assert_eq!(first.next, Some(2));
        assert_eq!(first.offset(), 0);

        let last = PageWindow::compute(45, 3, 20);
        assert_eq!(last.previous, Some(2));
        assert_eq!(last.next, None);
        assert_eq!(last.offset(), 40);
    }

    #[test]
    fn test_clamps_inputs() {
        let w = PageWindow::compute(5, 0, 0);
        assert_eq!(w.page, 1);
        assert_eq!(w.per_page, 1);
        assert_eq!(w.page_count, 5);
    }

    #[test]
    fn test_empty_result() {
        let w = PageWindow::compute(0, 1, 20);
        assert_eq!(w.page_count, 0);
        assert_eq!(w.next, None);
        assert_eq!(w.previous, None);
    }
}
