//! The `ExternalName` resource
//!
//! Maps a name in the API to a host outside the cluster. This module is the
//! whole composition of the kind: descriptor, strategy, attribute extractor,
//! column schema and [`new_storage`].

use crate::config::RestOptionsGetter;
use crate::core::attributes::{Attributes, default_attributes};
use crate::core::descriptor::ResourceInfo;
use crate::core::error::StoreError;
use crate::core::meta::{ObjectMeta, Resource};
use crate::core::strategy::{CreateStrategy, DeleteStrategy, GenericStrategy, UpdateStrategy};
use crate::core::table::{TableColumnDefinition, TableConverter, timestamp_cell};
use crate::core::validation::{FieldError, FieldErrors, is_dns1123_subdomain};
use crate::registry::{Store, StoreBuilder, StoreOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use validator::Validate;

pub const GROUP: &str = "service.kindstore.dev";
pub const VERSION: &str = "v0alpha1";
pub const KIND: &str = "ExternalName";

/// Field key the host is exposed under for field selectors
pub const HOST_FIELD: &str = "spec.host";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ExternalNameSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 253))]
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalName {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ExternalNameSpec,
}

impl ExternalName {
    pub fn new(namespace: &str, name: &str, host: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            spec: ExternalNameSpec {
                host: Some(host.into()),
            },
        }
    }

    pub fn without_host(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            spec: ExternalNameSpec::default(),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.spec.host.as_deref()
    }
}

impl Resource for ExternalName {
    type Spec = ExternalNameSpec;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn spec(&self) -> &ExternalNameSpec {
        &self.spec
    }
}

/// Descriptor for `externalnames.service.kindstore.dev`
pub fn resource_info() -> ResourceInfo<ExternalName> {
    ResourceInfo::new(GROUP, VERSION, KIND).with_default_factories()
}

/// Generic metadata handling plus host normalization and validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalNameStrategy {
    generic: GenericStrategy,
}

impl ExternalNameStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(obj: &mut ExternalName) {
        if let Some(host) = obj.spec.host.as_mut() {
            let normalized = host.trim().trim_end_matches('.').to_ascii_lowercase();
            *host = normalized;
        }
    }

    fn validate_spec(spec: &ExternalNameSpec) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if let Err(report) = spec.validate() {
            for (field, field_errors) in report.field_errors() {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    errors.push(FieldError::invalid(
                        format!("spec.{}", field),
                        spec.host.as_deref().unwrap_or_default(),
                        message,
                    ));
                }
            }
        }

        if let Some(host) = spec.host.as_deref().filter(|h| !h.is_empty()) {
            for message in is_dns1123_subdomain(host) {
                errors.push(FieldError::invalid(HOST_FIELD, host, message));
            }
        }

        errors
    }
}

impl CreateStrategy<ExternalName> for ExternalNameStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn prepare_for_create(&self, obj: &mut ExternalName) {
        CreateStrategy::prepare_for_create(&self.generic, obj);
        Self::normalize(obj);
    }

    fn validate(&self, obj: &ExternalName) -> FieldErrors {
        let mut errors = CreateStrategy::validate(&self.generic, obj);
        errors.extend(Self::validate_spec(&obj.spec));
        errors
    }
}

impl UpdateStrategy<ExternalName> for ExternalNameStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn prepare_for_update(&self, obj: &mut ExternalName, old: &ExternalName) {
        // Normalize first so a cosmetic host change does not bump the generation.
        Self::normalize(obj);
        UpdateStrategy::prepare_for_update(&self.generic, obj, old);
    }

    fn validate_update(&self, obj: &ExternalName, old: &ExternalName) -> FieldErrors {
        let mut errors = UpdateStrategy::validate_update(&self.generic, obj, old);
        errors.extend(Self::validate_spec(&obj.spec));
        errors
    }
}

impl DeleteStrategy<ExternalName> for ExternalNameStrategy {}

/// Labels, object metadata fields and `spec.host` when set
pub fn attributes(obj: &ExternalName) -> Attributes {
    default_attributes(obj).with_field(HOST_FIELD, obj.host())
}

pub fn column_definitions() -> Vec<TableColumnDefinition> {
    vec![
        TableColumnDefinition::new("Name", "string").with_format("name"),
        TableColumnDefinition::new("Host", "string").with_description("The service host"),
        TableColumnDefinition::new("Created At", "date"),
    ]
}

pub fn table_row(obj: &ExternalName) -> Result<Vec<Value>, StoreError> {
    Ok(vec![
        json!(obj.metadata.name),
        json!(obj.host().unwrap_or_default()),
        timestamp_cell(obj.metadata.creation_timestamp.as_ref()),
    ])
}

pub fn table_converter() -> TableConverter<ExternalName> {
    TableConverter::new(
        resource_info().group_resource(),
        column_definitions(),
        table_row,
    )
}

/// Compose the `ExternalName` store
pub fn new_storage(
    options_getter: Arc<dyn RestOptionsGetter>,
) -> Result<Store<ExternalName>, StoreError> {
    StoreBuilder::new(resource_info())
        .with_strategy(ExternalNameStrategy::new())
        .with_table_convertor(table_converter())
        .complete_with_options(StoreOptions::from_arc(options_getter).with_attr_fn(attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_identity() {
        let info = resource_info();
        assert_eq!(info.plural(), "externalnames");
        assert_eq!(info.singular(), "externalname");
        assert_eq!(info.group_version(), "service.kindstore.dev/v0alpha1");
        assert_eq!(
            info.group_resource().to_string(),
            "externalnames.service.kindstore.dev"
        );
        assert!(info.namespaced());
        assert_eq!(info.new_object(), Some(ExternalName::default()));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let strategy = ExternalNameStrategy::new();
        let mut obj = ExternalName::new("default", "svc-a", "  Example.COM. ");

        strategy.prepare_for_create(&mut obj);
        assert_eq!(obj.host(), Some("example.com"));
        let once = obj.clone();

        strategy.prepare_for_create(&mut obj);
        assert_eq!(obj, once);
    }

    #[test]
    fn test_validate_accepts_good_host() {
        let strategy = ExternalNameStrategy::new();
        let obj = ExternalName::new("default", "svc-a", "example.com");
        assert!(CreateStrategy::validate(&strategy, &obj).is_empty());

        let no_host = ExternalName::without_host("default", "svc-b");
        assert!(CreateStrategy::validate(&strategy, &no_host).is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let strategy = ExternalNameStrategy::new();

        let obj = ExternalName::new("default", "svc-a", "not a host");
        let errors = CreateStrategy::validate(&strategy, &obj);
        assert!(errors.has_field(HOST_FIELD));

        let empty = ExternalName::new("default", "svc-a", "");
        let errors = CreateStrategy::validate(&strategy, &empty);
        assert!(errors.has_field(HOST_FIELD));
    }

    #[test]
    fn test_attributes_include_host_only_when_set() {
        let obj = ExternalName::new("default", "svc-a", "example.com");
        let attrs = attributes(&obj);
        assert_eq!(attrs.field(HOST_FIELD), Some("example.com"));
        assert_eq!(attrs.field("metadata.name"), Some("svc-a"));
        assert_eq!(attrs.field("metadata.namespace"), Some("default"));

        let bare = ExternalName::without_host("default", "svc-b");
        assert_eq!(attributes(&bare).field(HOST_FIELD), None);
    }

    #[test]
    fn test_row_matches_schema() {
        let obj = ExternalName::without_host("default", "svc-b");
        let row = table_row(&obj).unwrap();
        assert_eq!(row.len(), column_definitions().len());
        assert_eq!(row[1], json!(""));
        assert_eq!(row[2], Value::Null);
    }
}
