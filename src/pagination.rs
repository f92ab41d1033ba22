//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of records per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A validated request for one page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of records on the page.
    pub per_page: u64,
}

impl PageRequest {
    /// Fill in missing values from `config`.
    pub fn with_defaults(page: Option<u64>, per_page: Option<u64>, config: &PaginationConfig) -> Self {
        Self {
            page: page.unwrap_or(config.default_page),
            per_page: per_page.unwrap_or(config.default_page_size),
        }
    }

    /// The number of records to skip to reach this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of records plus the metadata needed to fetch the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The records on this page.
    pub data: Vec<T>,
    /// The number of records across all pages.
    pub total: u64,
    /// The requested page size.
    pub per_page: u64,
    /// The 1-based number of this page.
    pub current_page: u64,
    /// The number of the last page, at least 1 even when there are no records.
    pub last_page: u64,
}

impl<T> Page<T> {
    /// Assemble a page from the records fetched for `request` and the total
    /// number of matching records.
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            data,
            total,
            per_page: request.per_page,
            current_page: request.page,
            last_page: page_count(total, request.per_page),
        }
    }
}

fn page_count(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 1;
    }

    total.div_ceil(per_page).max(1)
}
