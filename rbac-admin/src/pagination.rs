//! Listing pagination

use serde::{Deserialize, Serialize};

/// A 1-based page request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl PageRequest {
    /// Create a page request. Zero values are raised to 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }
}

/// One page of an ordered listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Page number, starting at 1
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Items across all pages
    pub total: usize,
}

impl<T> Page<T> {
    /// Slice one page out of an already ordered, already filtered sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbac_admin::pagination::{Page, PageRequest};
    ///
    /// let page = Page::slice(1..13, PageRequest::new(3, 5));
    /// assert_eq!(page.items, vec![11, 12]);
    /// assert_eq!(page.total, 12);
    /// assert_eq!(page.last_page(), 3);
    /// ```
    pub fn slice<I>(items: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = items.into_iter();
        let total = iter.len();
        let items = iter
            .skip(request.offset())
            .take(request.per_page as usize)
            .collect();
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// Last page number (1 for an empty listing).
    pub fn last_page(&self) -> u32 {
        let per_page = self.per_page.max(1) as usize;
        (self.total.div_ceil(per_page)).max(1) as u32
    }

    /// Check if pages follow this one.
    pub fn has_more(&self) -> bool {
        self.page < self.last_page()
    }

    /// Transform the items, keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_zero() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_first_page() {
        let page = Page::slice(vec!["a", "b", "c", "d", "e", "f"], PageRequest::new(1, 5));
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.last_page(), 2);
        assert!(page.has_more());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(4, 5));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert!(!page.has_more());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page: Page<u8> = Page::slice(Vec::new(), PageRequest::new(1, 5));
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(1, 2)).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 3);
    }
}
