//! Response envelope and pagination shared by the API handlers.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Items per page when the client does not ask for something else.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Successful response body: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Raw `page` / `limit` query parameters.
///
/// Kept as strings so that junk values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn params(&self) -> PageParams {
        PageParams::new(
            parse_positive(self.page.as_deref()).unwrap_or(1),
            parse_positive(self.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Resolved page number (1-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// The slice of `items` on this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.limit).min(items.len());
        &items[start..end]
    }

    pub fn pagination(&self, total_items: usize) -> Pagination {
        Pagination {
            current_page: self.page,
            total_items,
            total_pages: total_items.div_ceil(self.limit),
            has_next: self.offset().saturating_add(self.limit) < total_items,
            has_prev: self.page > 1,
        }
    }
}

/// Pagination block returned next to a page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A page of items with its pagination block.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
