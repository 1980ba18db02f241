//! In-memory persistence for entities.
//!
//! Maps are guarded by `std::sync::RwLock`. Conditional mutations run their
//! check and their write under one write guard.

mod memory;
mod users;

pub use memory::InMemoryStore;
pub use users::InMemoryUserStore;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("duplicate key: {0}")]
    Duplicate(String),
}
