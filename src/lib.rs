//! # kindstore
//!
//! Composable, typed resource stores for API servers.
//!
//! A resource kind is served by plugging four pieces into a generic engine:
//!
//! - **Descriptor** ([`ResourceInfo`](core::ResourceInfo)): group, version,
//!   kind, plural/singular names and factories for empty instances
//! - **Strategy** ([`CreateStrategy`](core::CreateStrategy),
//!   [`UpdateStrategy`](core::UpdateStrategy), [`DeleteStrategy`](core::DeleteStrategy)):
//!   defaulting, validation and delete authorization
//! - **Attribute extractor** ([`AttributeExtractor`](core::AttributeExtractor)):
//!   labels and fields used to answer selectors
//! - **Table convertor** ([`TableConvertor`](core::TableConvertor)): column
//!   schema and row rendering for human-facing listings
//!
//! [`StoreBuilder`](registry::StoreBuilder) validates the wiring and returns a
//! [`Store`](registry::Store) with create, get, list, update, delete, watch and
//! table conversion over any [`Backend`](storage::Backend).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kindstore::prelude::*;
//! use kindstore::apis::external_name;
//!
//! let getter = Arc::new(ConfigOptionsGetter::new(StorageConfig::default())?);
//! let store = external_name::new_storage(getter)?;
//!
//! let created = store
//!     .create(ExternalName::new("default", "svc-a", "example.com"), &CreateOptions::default())
//!     .await?;
//!
//! let matching = store
//!     .list(&ListOptions::in_namespace("default").with_field_selector("spec.host=example.com"))
//!     .await?;
//! ```

pub mod apis;
pub mod config;
pub mod core;
pub mod registry;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        attributes::{AttributeExtractor, Attributes, default_attributes},
        descriptor::{GroupResource, ResourceInfo},
        meta::{ListMeta, Object, ObjectList, ObjectMeta, Resource, ResourceList},
        strategy::{CreateStrategy, DeleteStrategy, GenericStrategy, Strategy, UpdateStrategy},
        table::{
            IncludeObject, Table, TableColumnDefinition, TableConverter, TableConvertor,
            TableOptions, TableSource, timestamp_cell,
        },
        validation::{FieldError, FieldErrors},
    };

    // === Operations ===
    pub use crate::core::{
        events::{EventType, WatchEvent, WatchStream},
        options::{CreateOptions, DeleteOptions, ListOptions, Preconditions, UpdateOptions},
        selector::{FieldSelector, LabelSelector, SelectionPredicate},
    };

    // === Errors ===
    pub use crate::core::error::{ErrorResponse, StorageError, StoreError, StoreResult};

    // === Registry ===
    pub use crate::registry::{Store, StoreBuilder, StoreOptions};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryBackend;
    pub use crate::storage::{Backend, ChangeEvent, ChangeKind};

    // === Config ===
    pub use crate::config::{
        BackendKind, ConfigOptionsGetter, RestOptions, RestOptionsGetter, StorageConfig,
    };

    // === Resources ===
    pub use crate::apis::external_name::{ExternalName, ExternalNameSpec, ExternalNameStrategy};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use futures::StreamExt;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
