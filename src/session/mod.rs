//! Session memory: the slot holding the most recent generated response.
//!
//! The slot is an explicit object owned by the application state and handed
//! to every turn, so alternative policies (per-session maps, locked slots)
//! can be swapped in behind the [`SessionMemory`] trait.
//!
//! # Example
//!
//! ```rust
//! use story_weaver::session::{LastResponseSlot, SessionMemory};
//!
//! let memory = LastResponseSlot::new();
//! assert_eq!(memory.get(), None);
//!
//! memory.set("The dragon slept.".to_string());
//! assert_eq!(memory.get().as_deref(), Some("The dragon slept."));
//! ```

mod slot;

pub use slot::LastResponseSlot;

/// Single-value memory of the previous turn's response.
pub trait SessionMemory: Send + Sync + std::fmt::Debug {
    /// Current value, if any turn has completed.
    fn get(&self) -> Option<String>;

    /// Overwrite the stored value. Last write wins.
    fn set(&self, response: String);
}
