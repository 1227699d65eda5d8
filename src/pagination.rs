use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pager block returned with every page of results.
///
/// `page` here is clamped into `1..=total_pages`, while the query that
/// fetched the items used the page the caller asked for. A request past the
/// end therefore yields empty items alongside metadata describing the last
/// real page; pagers render from this block, not from the item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub offset: u64,
    pub limit: u32,
}

impl PageMeta {
    pub fn compute(total_count: u64, page: u32, page_size: u32) -> Self {
        let size = page_size.max(1);
        let total_pages = total_count.div_ceil(size as u64).max(1) as u32;
        let current = page.clamp(1, total_pages);
        Self {
            page: current,
            page_size: size,
            total_pages,
            total_count,
            has_prev: current > 1,
            has_next: current < total_pages,
            offset: (current as u64 - 1) * size as u64,
            limit: size,
        }
    }
}

/// Clamp a requested page to at least 1.
pub fn sanitize_page(page: i64) -> u32 {
    page.clamp(1, u32::MAX as i64) as u32
}

/// Parse a page from handler input; anything non-numeric means page 1.
pub fn parse_page(raw: &str) -> u32 {
    raw.trim().parse::<i64>().map(sanitize_page).unwrap_or(1)
}

/// Non-positive sizes mean the default; large ones are capped.
pub fn sanitize_page_size(size: i64) -> u32 {
    if size > 0 {
        size.min(MAX_PAGE_SIZE as i64) as u32
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Row offset for the page the caller asked for (not the clamped one).
pub fn query_offset(page: u32, page_size: u32) -> u64 {
    (page.max(1) as u64 - 1).saturating_mul(page_size as u64)
}
