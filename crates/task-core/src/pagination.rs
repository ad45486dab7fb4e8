//! Pagination primitives shared by the task-config and execution repositories.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    #[must_use]
    pub fn first() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64) * (self.size as u64)
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: u32,
}

impl PageInfo {
    #[must_use]
    pub fn new(request: PageRequest, total_elements: u64, number_of_elements: u32) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            ((total_elements + u64::from(request.size) - 1) / u64::from(request.size)) as u32
        };
        Self {
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: total_pages == 0 || request.page + 1 >= total_pages,
            number_of_elements,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let number_of_elements = content.len() as u32;
        let info = PageInfo::new(request, total_elements, number_of_elements);
        Self { content, info }
    }

    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            info: self.info,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.info.last
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        !self.info.first
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_info_computes_total_pages_by_ceiling_division() {
        let info = PageInfo::new(PageRequest::new(0, 20), 45, 20);
        assert_eq!(info.total_pages, 3);
        assert!(info.first);
        assert!(!info.last);
    }

    #[test]
    fn page_info_flags_last_page() {
        let info = PageInfo::new(PageRequest::new(2, 20), 45, 5);
        assert!(info.last);
    }

    #[test]
    fn empty_page_has_zero_pages() {
        let page: Page<i32> = Page::empty(PageRequest::first());
        assert!(page.is_empty());
        assert_eq!(page.info.total_pages, 0);
        assert!(page.info.last);
    }

    #[test]
    fn page_size_is_clamped_to_max() {
        let req = PageRequest::new(0, 10_000);
        assert_eq!(req.size, PageRequest::MAX_SIZE);
    }
}
