//! Persistence seam for the encoded filter state.
//!
//! The dashboard hands the query-string form of its filter state to a
//! [`StatePersistence`] after every transition. Where it ends up (a
//! browser URL, a file, nowhere) is up to the implementation.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives the encoded filter state after each transition.
pub trait StatePersistence: Send + Sync {
    /// Stores `query`, the encoded filter state without a leading `?`.
    fn persist(&self, query: &str);
}

/// A no-op implementation of [`StatePersistence`].
pub struct NullPersistence;

impl StatePersistence for NullPersistence {
    fn persist(&self, _query: &str) {}
}

/// Returns a shared [`NullPersistence`] instance.
#[must_use]
pub fn null_persistence() -> Arc<dyn StatePersistence> {
    Arc::new(NullPersistence)
}

/// Keeps every persisted query in memory.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    history: Mutex<Vec<String>>,
}

impl MemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently persisted query.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Every persisted query, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatePersistence for MemoryPersistence {
    fn persist(&self, query: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());
    }
}
