//! Resource traits and server-managed object metadata
//!
//! Every resource kind served by a [`Store`](crate::registry::Store) carries an
//! [`ObjectMeta`] block (identity plus the fields the store stamps on write) and
//! a typed spec payload. The [`Object`] and [`ObjectList`] traits are the
//! object-safe views used where the concrete kind is erased, such as table
//! rendering.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Metadata shared by every resource instance
///
/// `name`, `namespace`, `generate_name`, `labels` and `annotations` are owned by
/// the caller. `uid`, `resource_version`, `generation` and `creation_timestamp`
/// are stamped by the store and strategies; values supplied by callers on
/// create are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub generate_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub uid: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_version: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub generation: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl ObjectMeta {
    /// Metadata for a cluster-scoped object
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Metadata for a namespaced object
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// `namespace/name`, or just `name` for cluster-scoped objects
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Metadata attached to list responses and tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListMeta {
    /// Backend revision the list was read at
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_version: String,

    /// Token for fetching the next page, if any
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,

    /// Number of matching items after this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_item_count: Option<u64>,
}

/// A typed resource kind that can be stored by the generic engine
///
/// Implementors are plain data: the store serializes them to JSON documents,
/// so `Serialize`/`DeserializeOwned` must round-trip every field.
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The resource-specific payload
    type Spec: Clone + PartialEq + fmt::Debug + Send + Sync;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn spec(&self) -> &Self::Spec;
}

/// Object-safe view of any resource instance
pub trait Object: Send + Sync {
    /// Access for explicit downcasting to the concrete kind
    fn as_any(&self) -> &dyn Any;

    /// Rust type name of the concrete kind, used in error messages
    fn type_name(&self) -> &'static str;

    fn object_meta(&self) -> &ObjectMeta;
}

impl<T: Resource> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn object_meta(&self) -> &ObjectMeta {
        self.metadata()
    }
}

/// Object-safe view of a list of resource instances
pub trait ObjectList: Send + Sync {
    fn list_meta(&self) -> &ListMeta;

    fn objects(&self) -> Vec<&dyn Object>;
}

/// An ordered list of resource instances returned by list calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    #[serde(default)]
    pub metadata: ListMeta,
    pub items: Vec<T>,
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self {
            metadata: ListMeta::default(),
            items: Vec::new(),
        }
    }
}

impl<T> ResourceList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Resource> ObjectList for ResourceList<T> {
    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn objects(&self) -> Vec<&dyn Object> {
        self.items.iter().map(|item| item as &dyn Object).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Widget {
        metadata: ObjectMeta,
        spec: String,
    }

    impl Resource for Widget {
        type Spec = String;

        fn metadata(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn metadata_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }

        fn spec(&self) -> &String {
            &self.spec
        }
    }

    #[test]
    fn test_object_meta_serializes_camel_case_and_skips_empty() {
        let meta = ObjectMeta::namespaced("default", "svc-a").with_label("app", "web");
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["name"], "svc-a");
        assert_eq!(json["namespace"], "default");
        assert_eq!(json["labels"]["app"], "web");
        assert!(json.get("resourceVersion").is_none());
        assert!(json.get("generation").is_none());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(ObjectMeta::named("a").qualified_name(), "a");
        assert_eq!(ObjectMeta::namespaced("ns", "a").qualified_name(), "ns/a");
    }

    #[test]
    fn test_object_downcast() {
        let widget = Widget {
            metadata: ObjectMeta::named("w"),
            spec: "blue".to_string(),
        };
        let object: &dyn Object = &widget;

        assert!(object.as_any().downcast_ref::<Widget>().is_some());
        assert!(object.type_name().ends_with("Widget"));
        assert_eq!(object.object_meta().name, "w");
    }

    #[test]
    fn test_list_continue_token_renamed() {
        let list: ResourceList<Widget> = ResourceList {
            metadata: ListMeta {
                resource_version: "7".to_string(),
                continue_token: Some("/registry/widgets/w".to_string()),
                remaining_item_count: Some(2),
            },
            items: vec![],
        };
        let json = serde_json::to_value(&list).unwrap();

        assert_eq!(json["metadata"]["continue"], "/registry/widgets/w");
        assert_eq!(json["metadata"]["remainingItemCount"], 2);
        assert!(list.is_empty());
    }
}
