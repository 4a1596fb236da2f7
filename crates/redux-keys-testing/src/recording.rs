//! A dispatch that only records.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use redux_keys::{Dispatch, Envelope};

/// Records every envelope sent through its [`Dispatch`].
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatch {
    seen: Arc<Mutex<Vec<Envelope>>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatch handle feeding this recorder.
    pub fn dispatch(&self) -> Dispatch {
        let seen = Arc::clone(&self.seen);
        Dispatch::new(move |envelope| lock(&seen).push(envelope))
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        lock(&self.seen).clone()
    }

    /// Type keys in dispatch order.
    pub fn type_keys(&self) -> Vec<String> {
        lock(&self.seen)
            .iter()
            .map(|envelope| envelope.type_key.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.seen).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.seen).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.seen).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
