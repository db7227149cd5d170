//! Prioritized fan-out items.

use crate::query::{AnyQuery, Completion, Query};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Importance of a fan-out item.
///
/// Items whose priority is at or above the configured threshold are
/// mandatory; the rest are optional.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(u32);

impl Priority {
    /// Creates a priority.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One independently loadable item of a fan-out batch.
pub struct PriorityItem<T> {
    priority: Priority,
    loader: AnyQuery<anyhow::Result<T>>,
}

impl<T: Send + 'static> PriorityItem<T> {
    /// Creates an item loaded by `loader`.
    pub fn new<Q>(priority: Priority, loader: Q) -> Self
    where
        Q: Query<Output = anyhow::Result<T>> + 'static,
    {
        Self {
            priority,
            loader: AnyQuery::new(loader),
        }
    }
}

impl<T> PriorityItem<T> {
    /// The item's priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns true if the item must succeed under `threshold`.
    #[must_use]
    pub fn is_mandatory(&self, threshold: Priority) -> bool {
        self.priority >= threshold
    }
}

impl<T> Clone for PriorityItem<T> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            loader: self.loader.clone(),
        }
    }
}

impl<T: Send + 'static> Query for PriorityItem<T> {
    type Output = anyhow::Result<T>;

    fn load(&self, completion: Completion<anyhow::Result<T>>) {
        self.loader.load(completion);
    }
}

impl<T> fmt::Debug for PriorityItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityItem")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
