//! Pagination types for list results.
//!
//! [`PaginationParams`] describes one requested window (0-indexed page plus page size),
//! [`PaginationConfig`] holds the per-resource defaults, and [`Page`] is a computed page
//! of results with its metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::min;

/// A single page of paginated results.
///
/// # Example
///
/// ```ignore
/// use docrest::page::Page;
///
/// let page = Page::builder(vec!["item1".to_string()])
///     .with_total(100)
///     .with_page(3)
///     .with_page_size(1)
///     .build();
///
/// assert_eq!(page.data.len(), 1);
/// assert_eq!(page.total, 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub data: Vec<T>,
    /// Total count of items across all pages.
    pub total: usize,
    /// The requested page number (0-indexed).
    pub page: usize,
    /// The requested page size.
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page.
    pub fn builder(data: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(data)
    }
}

impl Page<Value> {
    /// Renders the page as a response body, naming the page and page size members with
    /// the configured keys.
    pub fn into_body(self, page_key: &str, page_size_key: &str) -> Value {
        let mut body = Map::new();
        body.insert("total".to_string(), Value::from(self.total));
        body.insert("data".to_string(), Value::Array(self.data));
        body.insert(page_key.to_string(), Value::from(self.page));
        body.insert(page_size_key.to_string(), Value::from(self.page_size));
        Value::Object(body)
    }
}

/// Builder for constructing [`Page`] instances.
pub struct PageBuilder<T> {
    data: Vec<T>,
    total: usize,
    page: usize,
    page_size: usize,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(data: Vec<T>) -> Self {
        Self { data, total: 0, page: 0, page_size: 0 }
    }

    /// Sets the total count of items across all pages.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            data: self.data,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// One requested window of a result set.
///
/// Pages are 0-indexed: page 0 starts at the first item.
///
/// # Example
///
/// ```ignore
/// use docrest::page::PaginationParams;
///
/// let params = PaginationParams::new(2, 50);
/// assert_eq!(params.offset(), 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// The page number (0-indexed).
    pub page: usize,
    /// Number of items per page.
    pub page_size: usize,
}

impl PaginationParams {
    /// Creates new pagination parameters.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Number of items to skip: `page * page_size`.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// Computes the `[start, end)` slice of a result set of `total` items.
    ///
    /// Returns `None` when the page starts at or past the end of the result set;
    /// otherwise `end` is clamped to `total`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let params = PaginationParams::new(1, 3);
    /// assert_eq!(params.window(5), Some((3, 5)));
    /// assert_eq!(PaginationParams::new(2, 3).window(5), None);
    /// ```
    pub fn window(&self, total: usize) -> Option<(usize, usize)> {
        let start = self.offset();
        if start >= total {
            return None;
        }

        Some((start, min(start.saturating_add(self.page_size), total)))
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 0, page_size: 10 }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_page_key() -> String {
    "page".to_string()
}

fn default_page_size_key() -> String {
    "pageSize".to_string()
}

fn default_page_size() -> usize {
    10
}

/// Pagination settings of a list resource.
///
/// Deserializes with defaults for every missing key, so hosts can keep these settings
/// in their own configuration files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Whether list responses are paginated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Name of the page number argument (and response member).
    #[serde(default = "default_page_key")]
    pub page_key: String,
    /// Name of the page size argument (and response member).
    #[serde(default = "default_page_size_key")]
    pub page_size_key: String,
    /// Page size used when the request doesn't name one.
    #[serde(default = "default_page_size")]
    pub page_size_default: usize,
    /// Hard cap on unpaginated responses (`0` disables the cap).
    #[serde(default)]
    pub max_count: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            page_key: default_page_key(),
            page_size_key: default_page_size_key(),
            page_size_default: default_page_size(),
            max_count: 0,
        }
    }
}

impl PaginationConfig {
    /// Unpaginated listing, optionally capped at `max_count` records.
    pub fn disabled(max_count: usize) -> Self {
        Self { enabled: false, max_count, ..Self::default() }
    }
}
