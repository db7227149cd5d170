//! Incremental pagination.
//!
//! A [`Paginator`] loads a list one page at a time, keeps what it has loaded
//! and hands the cumulative list to callers. Page fetches are deduplicated:
//! callers arriving during a fetch ride along with it.

mod page;
mod paginator;

pub use page::{Page, PaginatorConfig};
pub use paginator::{PageFactory, Paginator};
