//! Storage backends for the generic store engine

pub mod backend;
#[cfg(feature = "in-memory")]
pub mod in_memory;

pub use backend::{Backend, ChangeEvent, ChangeFeed, ChangeKind, ListPage, StoredObject};
#[cfg(feature = "in-memory")]
pub use in_memory::InMemoryBackend;
