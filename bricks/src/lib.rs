//! # Bricks
//!
//! Composable, completion-based data-loading queries.
//!
//! Every building block is a [`Query`](query::Query): an asynchronous
//! operation that hands one result to a completion callback. Blocks wrap
//! other blocks, so pipelines are built by nesting:
//!
//! - **Single-flight**: collapse concurrent loads into one underlying load
//! - **Pagination**: accumulate pages with deduplicated fetches and reset
//! - **Prioritized fan-out**: load many items concurrently under a deadline,
//!   waiting only for the mandatory ones
//! - **Decorators**: mapping, failover, notification, write-through storage,
//!   expiring caches and parallel pairs
//!
//! Components keep their state behind an `Arc` and resume through a `Weak`,
//! so dropping a component mid-load silently drops the pending completions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bricks::prelude::*;
//!
//! let articles = Paginator::new(|page| ArticlesPage::new(page))
//!     .map(|result| result.map(|page| page.items));
//!
//! articles.load(Box::new(|items| println!("{items:?}")));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod command;
pub mod coordination;
pub mod decorators;
pub mod errors;
pub mod fanout;
pub mod observability;
pub mod pagination;
pub mod query;
pub mod storage;
pub mod testing;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::command::Command;
    pub use crate::coordination::SingleFlight;
    pub use crate::decorators::{
        ExpiringCache, Fallback, Map, Notifying, SecondChance, Storing, Zip,
    };
    pub use crate::errors::{Abandoned, CacheError, FanOutError, StorageError};
    pub use crate::fanout::{FanOutConfig, FanOutResult, Priority, PriorityFanOut, PriorityItem};
    pub use crate::observability::{init_tracing, LogFormat, TracingConfig};
    pub use crate::pagination::{Page, Paginator, PaginatorConfig};
    pub use crate::query::{
        AnyQuery, Completion, FailableQuery, FailableQueryExt, FnQuery, Query, QueryExt,
    };
    pub use crate::storage::{
        InMemoryStorage, MaxAge, Storage, SynchronousStorage, SynchronousStorageAdapter,
        TimestampValidationPolicy,
    };
}
