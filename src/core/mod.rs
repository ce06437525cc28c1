//! Core module containing the resource model and the composition traits

pub mod attributes;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod meta;
pub mod options;
pub mod selector;
pub mod strategy;
pub mod table;
pub mod validation;

pub use attributes::{AttributeExtractor, Attributes};
pub use descriptor::{GroupResource, ResourceInfo};
pub use error::{StorageError, StoreError, StoreResult};
pub use events::{EventType, WatchEvent, WatchStream};
pub use meta::{ListMeta, Object, ObjectList, ObjectMeta, Resource, ResourceList};
pub use options::{CreateOptions, DeleteOptions, ListOptions, Preconditions, UpdateOptions};
pub use selector::{FieldSelector, LabelSelector, SelectionPredicate};
pub use strategy::{CreateStrategy, DeleteStrategy, GenericStrategy, Strategy, UpdateStrategy};
pub use table::{Table, TableColumnDefinition, TableConverter, TableConvertor, TableOptions, TableSource};
pub use validation::{FieldError, FieldErrors};
