//! Resource kinds served by this crate

pub mod external_name;

pub use external_name::{ExternalName, ExternalNameSpec, ExternalNameStrategy};
