use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

/// Slice an already-filtered, already-sorted list into a page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let page_size = request.page_size.max(1);
    let total_pages = total.div_ceil(page_size as u64) as u32;
    let page = request.page.max(1);

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let items = items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();

    Page {
        items,
        total,
        current_page: page,
        total_pages,
    }
}
