use serde::{Deserialize, Serialize};

/// Which page of a listing to fetch. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Posts per page for blog listings.
    pub const DEFAULT_PER_PAGE: u64 = 10;

    /// Page `page` with the default size. Page numbers below 1 clamp to 1.
    pub fn new(page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of results plus totals for the whole listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages: total_items.div_ceil(request.per_page.max(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_to_first_page() {
        assert_eq!(PageRequest::new(0).page, 1);
        assert_eq!(PageRequest::new(0).offset(), 0);
        assert_eq!(PageRequest::new(3).offset(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(3), 23);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
