//! Process-wide single-slot memory.

use std::sync::{Arc, PoisonError, RwLock};

use super::SessionMemory;

/// One shared `Option<String>` slot.
///
/// Clones share the same slot. Reads and writes are individually atomic;
/// a read followed by a write is not, so concurrent turns must be
/// serialized by the caller if stale reads matter.
#[derive(Debug, Clone, Default)]
pub struct LastResponseSlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl LastResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionMemory for LastResponseSlot {
    fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, response: String) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(response);
    }
}
