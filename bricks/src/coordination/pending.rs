//! Completions waiting on one in-flight load.

use crate::query::Completion;
use std::fmt;

/// FIFO set of completions waiting on the same in-flight load.
///
/// Owners keep this behind their lock, take it in one step when the load
/// resolves, and deliver after the lock is released.
pub struct PendingCallbacks<R> {
    callbacks: Vec<Completion<R>>,
}

impl<R> PendingCallbacks<R> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Appends a completion. Returns true if the set was empty before.
    pub fn push(&mut self, completion: Completion<R>) -> bool {
        let first = self.callbacks.is_empty();
        self.callbacks.push(completion);
        first
    }

    /// Takes every waiting completion, leaving the set empty.
    #[must_use]
    pub fn take(&mut self) -> Delivery<R> {
        Delivery {
            callbacks: std::mem::take(&mut self.callbacks),
        }
    }

    /// Number of waiting completions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<R> Default for PendingCallbacks<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for PendingCallbacks<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallbacks")
            .field("len", &self.len())
            .finish()
    }
}

/// Completions captured from a [`PendingCallbacks`], ready for delivery.
///
/// Must be delivered outside the owner's lock: completions are free to call
/// back into the owner.
#[must_use = "captured completions are lost unless delivered"]
pub struct Delivery<R> {
    callbacks: Vec<Completion<R>>,
}

impl<R: Clone> Delivery<R> {
    /// Hands `result` to every captured completion in FIFO order.
    ///
    /// The last completion receives `result` itself, the others clones.
    pub fn deliver(self, result: R) {
        let mut callbacks = self.callbacks.into_iter();
        let Some(mut current) = callbacks.next() else {
            return;
        };
        for next in callbacks {
            current(result.clone());
            current = next;
        }
        current(result);
    }
}

impl<R> Delivery<R> {
    /// Number of captured completions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ResultRecorder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_reports_first_caller() {
        let mut pending = PendingCallbacks::<u8>::new();

        assert!(pending.push(Box::new(|_| {})));
        assert!(!pending.push(Box::new(|_| {})));
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_take_empties_and_delivers_fifo() {
        let recorder = ResultRecorder::new();
        let order = ResultRecorder::new();
        let mut pending = PendingCallbacks::new();

        for tag in 0..3 {
            let recorder = recorder.clone();
            let order = order.clone();
            pending.push(Box::new(move |value: String| {
                recorder.record(value);
                order.record(tag);
            }));
        }

        let delivery = pending.take();
        assert!(pending.is_empty());
        assert_eq!(delivery.len(), 3);

        delivery.deliver("same".to_string());
        assert_eq!(recorder.results(), vec!["same", "same", "same"]);
        assert_eq!(order.results(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dropped_delivery_invokes_nothing() {
        let recorder = ResultRecorder::<u8>::new();
        let mut pending = PendingCallbacks::new();
        pending.push(recorder.completion());
        pending.push(recorder.completion());

        drop(pending.take());
        pending.take().deliver(1);

        assert!(recorder.is_empty());
    }
}
