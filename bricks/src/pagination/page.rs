//! Page values and paginator configuration.

use serde::{Deserialize, Serialize};

/// Everything a paginator has loaded so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items of every page loaded since creation or the last reset, in order.
    pub items: Vec<T>,
    /// False once a page came back empty.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Creates a page value.
    #[must_use]
    pub const fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// Number of accumulated items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Configuration for a [`Paginator`](super::Paginator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatorConfig {
    /// Page number requested first, and again after every reset.
    pub first_page: u64,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self { first_page: 0 }
    }
}

impl PaginatorConfig {
    /// Creates the default config (pages counted from zero).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first page number.
    #[must_use]
    pub const fn with_first_page(mut self, first_page: u64) -> Self {
        self.first_page = first_page;
        self
    }
}
