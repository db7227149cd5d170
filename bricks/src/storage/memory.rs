//! In-memory synchronous storage.

use super::SynchronousStorage;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;

/// Holds one value in memory together with the time it was saved.
pub struct InMemoryStorage<T> {
    slot: RwLock<Option<Stored<T>>>,
}

struct Stored<T> {
    value: T,
    saved_at: DateTime<Utc>,
}

impl<T> InMemoryStorage<T> {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> Default for InMemoryStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SynchronousStorage for InMemoryStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.slot.read().as_ref().map(|stored| stored.saved_at)
    }

    fn load(&self) -> Option<T> {
        self.slot.read().as_ref().map(|stored| stored.value.clone())
    }

    fn save(&self, value: T) {
        *self.slot.write() = Some(Stored {
            value,
            saved_at: Utc::now(),
        });
    }

    fn clear(&self) {
        *self.slot.write() = None;
    }
}

impl<T> fmt::Debug for InMemoryStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("saved_at", &self.slot.read().as_ref().map(|s| s.saved_at))
            .finish_non_exhaustive()
    }
}
