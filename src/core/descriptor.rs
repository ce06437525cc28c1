//! Static resource descriptors
//!
//! A [`ResourceInfo`] is the immutable description of one resource kind: its
//! group/version/kind, singular and plural names, scope, and the factories the
//! store uses to produce empty instances and lists. Descriptors are plain
//! values built at startup and handed to the
//! [`StoreBuilder`](crate::registry::StoreBuilder).

use crate::core::error::StoreError;
use crate::core::meta::{Resource, ResourceList};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource qualified by its API group, e.g. `externalnames.service.kindstore.dev`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// Factory producing a zero-valued instance
pub type NewObjectFn<T> = fn() -> T;

/// Factory producing an empty list
pub type NewListFn<T> = fn() -> ResourceList<T>;

/// Static metadata about one resource kind
#[derive(Debug, Clone)]
pub struct ResourceInfo<T> {
    group: String,
    version: String,
    kind: String,
    singular: String,
    plural: String,
    namespaced: bool,
    new_fn: Option<NewObjectFn<T>>,
    new_list_fn: Option<NewListFn<T>>,
}

impl<T: Resource> ResourceInfo<T> {
    /// Describe a namespaced kind; names are derived from `kind`
    ///
    /// Factories are left unset: call [`with_default_factories`](Self::with_default_factories)
    /// or the explicit setters.
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let singular = kind.to_lowercase();
        let plural = pluralize(&singular);
        Self {
            group: group.into(),
            version: version.into(),
            kind,
            singular,
            plural,
            namespaced: true,
            new_fn: None,
            new_list_fn: None,
        }
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    pub fn with_singular(mut self, singular: impl Into<String>) -> Self {
        self.singular = singular.into();
        self
    }

    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }

    pub fn with_new_func(mut self, f: NewObjectFn<T>) -> Self {
        self.new_fn = Some(f);
        self
    }

    pub fn with_new_list_func(mut self, f: NewListFn<T>) -> Self {
        self.new_list_fn = Some(f);
        self
    }

    /// Use `T::default()` and an empty `ResourceList<T>` as factories
    pub fn with_default_factories(self) -> Self
    where
        T: Default,
    {
        self.with_new_func(T::default)
            .with_new_list_func(ResourceList::<T>::default)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn namespaced(&self) -> bool {
        self.namespaced
    }

    /// `group/version`, or just `version` for the core group
    pub fn group_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Plural identity, used for routing, storage keys and error messages
    pub fn group_resource(&self) -> GroupResource {
        GroupResource::new(&self.group, &self.plural)
    }

    /// Singular identity
    pub fn singular_group_resource(&self) -> GroupResource {
        GroupResource::new(&self.group, &self.singular)
    }

    /// A zero-valued instance, if a factory is configured
    pub fn new_object(&self) -> Option<T> {
        self.new_fn.map(|f| f())
    }

    /// An empty list, if a factory is configured
    pub fn new_list(&self) -> Option<ResourceList<T>> {
        self.new_list_fn.map(|f| f())
    }

    /// Reject descriptors that cannot back a store
    pub(crate) fn check(&self) -> Result<(), StoreError> {
        if self.kind.is_empty() {
            return Err(StoreError::misconfigured("resource descriptor has no kind"));
        }
        if self.plural.is_empty() || self.singular.is_empty() {
            return Err(StoreError::misconfigured(format!(
                "resource descriptor for {} must define singular and plural names",
                self.kind
            )));
        }
        if self.new_fn.is_none() {
            return Err(StoreError::misconfigured(format!(
                "{} must have a new object factory",
                self.group_resource()
            )));
        }
        if self.new_list_fn.is_none() {
            return Err(StoreError::misconfigured(format!(
                "{} must have a new list factory",
                self.group_resource()
            )));
        }
        Ok(())
    }
}

/// Lower-case English plural of a kind name
fn pluralize(singular: &str) -> String {
    if singular.is_empty() {
        return String::new();
    }
    if let Some(stem) = singular.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| singular.ends_with(suffix))
    {
        return format!("{}es", singular);
    }
    format!("{}s", singular)
}
