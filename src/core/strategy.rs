//! Resource-specific mutation hooks
//!
//! The store calls into these traits at fixed points of every mutation:
//!
//! ```text
//! create:  received → prepare_for_create → validate → persist | reject
//! update:  received → prepare_for_update → validate_update → persist | reject
//! delete:  received → check_delete → remove | reject
//! ```
//!
//! Strategies only ever touch the object they are handed. They must not
//! perform I/O against the backend; a rejected object leaves nothing behind.

use crate::core::error::StoreError;
use crate::core::meta::Resource;
use crate::core::validation::{FieldError, FieldErrors, validate_object_meta};

/// Hooks run before an object is first persisted
pub trait CreateStrategy<T: Resource>: Send + Sync {
    fn namespace_scoped(&self) -> bool;

    /// Apply defaults and stamp derived fields; must be idempotent
    fn prepare_for_create(&self, obj: &mut T);

    fn validate(&self, obj: &T) -> FieldErrors;
}

/// Hooks run before an existing object is replaced
pub trait UpdateStrategy<T: Resource>: Send + Sync {
    fn namespace_scoped(&self) -> bool;

    /// When true, updating a missing object creates it
    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut T, old: &T);

    fn validate_update(&self, obj: &T, old: &T) -> FieldErrors;
}

/// Authorization hook run before an object is removed
pub trait DeleteStrategy<T: Resource>: Send + Sync {
    fn check_delete(&self, _obj: &T) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Convenience bound for types implementing every capability
pub trait Strategy<T: Resource>: CreateStrategy<T> + UpdateStrategy<T> + DeleteStrategy<T> {}

impl<T, S> Strategy<T> for S
where
    T: Resource,
    S: CreateStrategy<T> + UpdateStrategy<T> + DeleteStrategy<T>,
{
}

/// Strategy suitable for most kinds
///
/// - create sets `metadata.generation` to 1
/// - update carries the generation forward and bumps it when the spec changes
/// - object metadata is validated on create and update; name and namespace are immutable
/// - deletes are always allowed
#[derive(Debug, Clone, Copy)]
pub struct GenericStrategy {
    namespaced: bool,
}

impl GenericStrategy {
    pub fn new() -> Self {
        Self { namespaced: true }
    }

    pub fn cluster_scoped() -> Self {
        Self { namespaced: false }
    }
}

impl Default for GenericStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> CreateStrategy<T> for GenericStrategy {
    fn namespace_scoped(&self) -> bool {
        self.namespaced
    }

    fn prepare_for_create(&self, obj: &mut T) {
        obj.metadata_mut().generation = 1;
    }

    fn validate(&self, obj: &T) -> FieldErrors {
        validate_object_meta(obj.metadata(), self.namespaced)
    }
}

impl<T: Resource> UpdateStrategy<T> for GenericStrategy {
    fn namespace_scoped(&self) -> bool {
        self.namespaced
    }

    fn prepare_for_update(&self, obj: &mut T, old: &T) {
        let spec_changed = obj.spec() != old.spec();
        let meta = obj.metadata_mut();
        meta.generation = old.metadata().generation;
        if spec_changed {
            meta.generation += 1;
        }
    }

    fn validate_update(&self, obj: &T, old: &T) -> FieldErrors {
        let mut errors = validate_object_meta(obj.metadata(), self.namespaced);
        let (new_meta, old_meta) = (obj.metadata(), old.metadata());
        if new_meta.name != old_meta.name {
            errors.push(FieldError::forbidden(
                "metadata.name",
                "field is immutable",
            ));
        }
        if new_meta.namespace != old_meta.namespace {
            errors.push(FieldError::forbidden(
                "metadata.namespace",
                "field is immutable",
            ));
        }
        errors
    }
}

impl<T: Resource> DeleteStrategy<T> for GenericStrategy {}
