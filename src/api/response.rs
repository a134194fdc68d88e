/// JSON envelopes for non-binary responses
use serde::{Deserialize, Serialize};

/// Success envelope: `{"success": true, "message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error: false,
            message: message.into(),
        }
    }
}

/// Page description attached to list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// The whole result as one page
    pub fn single_page(total_items: usize) -> Self {
        Self {
            page: 1,
            page_size: total_items,
            total_items,
            total_pages: 1,
        }
    }
}

/// List envelope: `{"items": [...], "pagination": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn single_page(items: Vec<T>) -> Self {
        let pagination = Pagination::single_page(items.len());
        Self { items, pagination }
    }
}
