//! Completion-based access to synchronous storage.

use super::{Storage, SynchronousStorage};
use crate::errors::StorageError;
use crate::query::Completion;
use chrono::{DateTime, Utc};
use std::fmt;

/// Exposes a [`SynchronousStorage`] through the [`Storage`] contract.
///
/// Completions run before the call returns. Loading from an empty store
/// fails with [`StorageError::Empty`]; saving and clearing never fail.
pub struct SynchronousStorageAdapter<S> {
    inner: S,
}

impl<S: SynchronousStorage> SynchronousStorageAdapter<S> {
    /// Wraps `inner`.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped storage.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SynchronousStorage> Storage for SynchronousStorageAdapter<S> {
    type Value = S::Value;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.inner.timestamp()
    }

    fn load(&self, completion: Completion<anyhow::Result<S::Value>>) {
        completion(self.inner.load().ok_or_else(|| StorageError::Empty.into()));
    }

    fn save(&self, value: S::Value, completion: Completion<anyhow::Result<()>>) {
        self.inner.save(value);
        completion(Ok(()));
    }

    fn clear(&self, completion: Completion<anyhow::Result<()>>) {
        self.inner.clear();
        completion(Ok(()));
    }
}

impl<S> fmt::Debug for SynchronousStorageAdapter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronousStorageAdapter").finish_non_exhaustive()
    }
}
