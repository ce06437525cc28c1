//! Attribute extraction for selector filtering
//!
//! The store never looks inside a resource to answer a label or field
//! selector. It asks the kind's [`AttributeExtractor`] for an [`Attributes`]
//! snapshot and evaluates the selector against that. Extraction runs on every
//! list item and every watch event, so it must be a pure function of the
//! object.

use crate::core::meta::{ObjectMeta, Resource};
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;
pub type Fields = BTreeMap<String, String>;

/// Indexable label and field values derived from one object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub labels: Labels,
    pub fields: Fields,
}

impl Attributes {
    pub fn new(labels: Labels, fields: Fields) -> Self {
        Self { labels, fields }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Add a field; `None` leaves the field absent
    pub fn with_field(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.fields.insert(key.into(), value.into());
        }
        self
    }
}

/// Maps a stored object to its [`Attributes`]
///
/// Implemented for every `Fn(&T) -> Attributes`, so plain functions such as
/// [`default_attributes`] can be passed directly.
pub trait AttributeExtractor<T>: Send + Sync {
    fn attributes(&self, obj: &T) -> Attributes;
}

impl<T, F> AttributeExtractor<T> for F
where
    F: Fn(&T) -> Attributes + Send + Sync,
{
    fn attributes(&self, obj: &T) -> Attributes {
        self(obj)
    }
}

/// `metadata.name` and, when set, `metadata.namespace`
pub fn object_meta_fields(meta: &ObjectMeta) -> Fields {
    let mut fields = Fields::new();
    fields.insert("metadata.name".to_string(), meta.name.clone());
    if !meta.namespace.is_empty() {
        fields.insert("metadata.namespace".to_string(), meta.namespace.clone());
    }
    fields
}

/// Labels plus object metadata fields; the extractor used when a kind
/// declares nothing more specific
pub fn default_attributes<T: Resource>(obj: &T) -> Attributes {
    let meta = obj.metadata();
    Attributes::new(meta.labels.clone(), object_meta_fields(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Note {
        metadata: ObjectMeta,
        spec: Option<String>,
    }

    impl Resource for Note {
        type Spec = Option<String>;

        fn metadata(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn metadata_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }

        fn spec(&self) -> &Option<String> {
            &self.spec
        }
    }

    fn note_attributes(note: &Note) -> Attributes {
        default_attributes(note).with_field("spec.text", note.spec.clone())
    }

    #[test]
    fn test_default_attributes() {
        let note = Note {
            metadata: ObjectMeta::namespaced("team-a", "n1").with_label("tier", "gold"),
            spec: None,
        };
        let attrs = default_attributes(&note);

        assert_eq!(attrs.label("tier"), Some("gold"));
        assert_eq!(attrs.field("metadata.name"), Some("n1"));
        assert_eq!(attrs.field("metadata.namespace"), Some("team-a"));
    }

    #[test]
    fn test_cluster_scoped_omits_namespace_field() {
        let fields = object_meta_fields(&ObjectMeta::named("n1"));
        assert!(!fields.contains_key("metadata.namespace"));
    }

    #[test]
    fn test_absent_field_is_omitted() {
        let note = Note {
            metadata: ObjectMeta::namespaced("team-a", "n1"),
            spec: None,
        };
        let attrs = note_attributes(&note);
        assert!(!attrs.fields.contains_key("spec.text"));
    }

    #[test]
    fn test_fn_items_are_extractors() {
        let extractor: &dyn AttributeExtractor<Note> = &note_attributes;
        let note = Note {
            metadata: ObjectMeta::namespaced("team-a", "n1"),
            spec: Some("hello".to_string()),
        };

        let first = extractor.attributes(&note);
        let second = extractor.attributes(&note);
        assert_eq!(first, second);
        assert_eq!(first.field("spec.text"), Some("hello"));
    }
}
