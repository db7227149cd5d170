//! Storage backends for caching decorators.
//!
//! This module provides:
//! - `SynchronousStorage` and `Storage`, the blocking and completion-based
//!   storage contracts
//! - `InMemoryStorage`, a thread-safe synchronous store
//! - `SynchronousStorageAdapter`, lifting a synchronous store to `Storage`
//! - `TimestampValidationPolicy` and its stock implementations

mod adapter;
mod memory;
mod policy;

pub use adapter::SynchronousStorageAdapter;
pub use memory::InMemoryStorage;
pub use policy::{MaxAge, TimestampValidationPolicy};

#[cfg(test)]
pub use policy::MockTimestampValidationPolicy;

use crate::query::Completion;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Storage that answers on the calling thread.
pub trait SynchronousStorage: Send + Sync {
    /// Type of the stored value.
    type Value: Send + 'static;

    /// When the value was last saved; `None` when empty.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Returns the stored value, if any.
    fn load(&self) -> Option<Self::Value>;

    /// Replaces the stored value.
    fn save(&self, value: Self::Value);

    /// Removes the stored value and its timestamp.
    fn clear(&self);
}

/// Storage with completion-based access.
///
/// Implementations decide how loading failures are reported; an empty store
/// is one of them.
pub trait Storage: Send + Sync {
    /// Type of the stored value.
    type Value: Send + 'static;

    /// When the value was last saved; `None` when empty.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Retrieves the stored value.
    fn load(&self, completion: Completion<anyhow::Result<Self::Value>>);

    /// Replaces the stored value.
    fn save(&self, value: Self::Value, completion: Completion<anyhow::Result<()>>);

    /// Removes the stored value and resets the timestamp.
    fn clear(&self, completion: Completion<anyhow::Result<()>>);
}

impl<S: SynchronousStorage + ?Sized> SynchronousStorage for Arc<S> {
    type Value = S::Value;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }

    fn load(&self) -> Option<S::Value> {
        (**self).load()
    }

    fn save(&self, value: S::Value) {
        (**self).save(value);
    }

    fn clear(&self) {
        (**self).clear();
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    type Value = S::Value;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }

    fn load(&self, completion: Completion<anyhow::Result<S::Value>>) {
        (**self).load(completion);
    }

    fn save(&self, value: S::Value, completion: Completion<anyhow::Result<()>>) {
        (**self).save(value, completion);
    }

    fn clear(&self, completion: Completion<anyhow::Result<()>>) {
        (**self).clear(completion);
    }
}
