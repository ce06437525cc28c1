//! Store composition and the generic store engine

pub mod builder;
pub mod store;

pub use builder::{StoreBuilder, StoreOptions};
pub use store::Store;
