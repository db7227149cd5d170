//! Error types for the bricks crate.
//!
//! Upstream failures are never wrapped: single-flight and pagination hand the
//! wrapped query's error to every waiter as-is. The types here cover the
//! failures that components introduce themselves.

use crate::fanout::Priority;
use std::time::Duration;
use thiserror::Error;

/// Failure of a prioritized fan-out batch.
///
/// At most one of these is delivered per batch.
#[derive(Debug, Error)]
pub enum FanOutError<E> {
    /// A mandatory item failed before every mandatory item had resolved.
    #[error("required item {index} (priority {priority}) failed: {source}")]
    RequiredItemFailed {
        /// Position of the failed item in the item list.
        index: usize,
        /// Priority of the failed item.
        priority: Priority,
        /// The item's own failure.
        source: anyhow::Error,
    },

    /// The deadline elapsed before every mandatory item had resolved.
    #[error("fan-out timed out after {timeout:?}")]
    TimeoutExpired {
        /// The deadline that was applied to the batch.
        timeout: Duration,
    },

    /// The item list itself could not be loaded.
    #[error("failed to load item list: {0}")]
    ItemListLoadFailed(#[source] E),
}

impl<E> FanOutError<E> {
    /// Returns true for [`FanOutError::RequiredItemFailed`].
    #[must_use]
    pub const fn is_required_item_failure(&self) -> bool {
        matches!(self, Self::RequiredItemFailed { .. })
    }

    /// Returns true for [`FanOutError::TimeoutExpired`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExpired { .. })
    }

    /// Returns the item-list failure, if that is what happened.
    #[must_use]
    pub const fn item_list_cause(&self) -> Option<&E> {
        match self {
            Self::ItemListLoadFailed(cause) => Some(cause),
            _ => None,
        }
    }
}

/// Errors raised by cache decorators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The stored value's timestamp was rejected by the validation policy.
    #[error("cached value expired")]
    Expired,
}

/// Errors raised by storage adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Nothing has been saved, or the storage was cleared.
    #[error("storage is empty")]
    Empty,
}

/// The completion of a query was dropped without being invoked.
///
/// Returned by [`QueryExt::load_async`](crate::query::QueryExt::load_async)
/// when the component serving the load was dropped or reset mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query completion was dropped before it was invoked")]
pub struct Abandoned;
