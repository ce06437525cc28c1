//! Storage configuration and per-resource REST options
//!
//! # Example
//!
//! ```yaml
//! backend: memory
//! prefix: /registry
//! watch_capacity: 1024
//! max_list_limit: 500
//! ```

use crate::core::descriptor::GroupResource;
use crate::core::error::StoreError;
use crate::storage::Backend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which backend implementation to construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Memory,
}

/// Storage settings shared by every resource store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,

    /// Root under which every resource's keys live
    pub prefix: String,

    /// Events buffered per watcher before it is reported as lagging
    pub watch_capacity: usize,

    /// Upper bound on a single list page
    pub max_list_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            prefix: "/registry".to_string(),
            watch_capacity: 1024,
            max_list_limit: 500,
        }
    }
}

impl StorageConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if !self.prefix.starts_with('/') {
            return Err(StoreError::misconfigured(format!(
                "storage prefix '{}' must start with '/'",
                self.prefix
            )));
        }
        if self.watch_capacity == 0 {
            return Err(StoreError::misconfigured(
                "watch_capacity must be greater than zero",
            ));
        }
        if self.max_list_limit == 0 {
            return Err(StoreError::misconfigured(
                "max_list_limit must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Construct the configured backend
    pub fn build_backend(&self) -> Result<Arc<dyn Backend>, StoreError> {
        self.validate()?;
        match self.backend {
            #[cfg(feature = "in-memory")]
            BackendKind::Memory => Ok(Arc::new(
                crate::storage::InMemoryBackend::with_watch_capacity(self.watch_capacity),
            )),
            #[cfg(not(feature = "in-memory"))]
            BackendKind::Memory => Err(StoreError::misconfigured(
                "the in-memory backend was not compiled in (enable the `in-memory` feature)",
            )),
        }
    }
}

/// Engine options for one resource
#[derive(Clone)]
pub struct RestOptions {
    pub backend: Arc<dyn Backend>,

    /// Key prefix for this resource, e.g. `/registry/service.kindstore.dev/externalnames`
    pub resource_prefix: String,

    pub max_list_limit: usize,
}

impl fmt::Debug for RestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestOptions")
            .field("backend", &self.backend.name())
            .field("resource_prefix", &self.resource_prefix)
            .field("max_list_limit", &self.max_list_limit)
            .finish()
    }
}

/// Source of [`RestOptions`] for each resource a server composes
pub trait RestOptionsGetter: Send + Sync {
    fn rest_options(&self, resource: &GroupResource) -> Result<RestOptions, StoreError>;
}

/// Options getter backed by a [`StorageConfig`]; all resources share one backend
#[derive(Clone)]
pub struct ConfigOptionsGetter {
    config: StorageConfig,
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for ConfigOptionsGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptionsGetter")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ConfigOptionsGetter {
    pub fn new(config: StorageConfig) -> Result<Self, StoreError> {
        let backend = config.build_backend()?;
        Ok(Self { config, backend })
    }

    /// Use an existing backend instead of constructing one
    pub fn with_backend(config: StorageConfig, backend: Arc<dyn Backend>) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }
}

impl RestOptionsGetter for ConfigOptionsGetter {
    fn rest_options(&self, resource: &GroupResource) -> Result<RestOptions, StoreError> {
        let root = self.config.prefix.trim_end_matches('/');
        let resource_prefix = if resource.group.is_empty() {
            format!("{}/{}", root, resource.resource)
        } else {
            format!("{}/{}/{}", root, resource.group, resource.resource)
        };

        Ok(RestOptions {
            backend: self.backend.clone(),
            resource_prefix,
            max_list_limit: self.config.max_list_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.prefix, "/registry");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = StorageConfig::from_yaml_str("prefix: /data\nmax_list_limit: 10\n").unwrap();
        assert_eq!(config.prefix, "/data");
        assert_eq!(config.max_list_limit, 10);
        assert_eq!(config.watch_capacity, 1024);
    }

    #[test]
    fn test_yaml_unknown_backend_rejected() {
        assert!(StorageConfig::from_yaml_str("backend: etcd\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let relative = StorageConfig {
            prefix: "registry".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            relative.validate(),
            Err(StoreError::Misconfigured { .. })
        ));

        let no_limit = StorageConfig {
            max_list_limit: 0,
            ..Default::default()
        };
        assert!(no_limit.validate().is_err());
    }

    #[test]
    fn test_resource_prefix_layout() {
        let getter = ConfigOptionsGetter::new(StorageConfig {
            prefix: "/registry/".to_string(),
            ..Default::default()
        })
        .unwrap();

        let opts = getter
            .rest_options(&GroupResource::new("service.kindstore.dev", "externalnames"))
            .unwrap();
        assert_eq!(
            opts.resource_prefix,
            "/registry/service.kindstore.dev/externalnames"
        );

        let core = getter
            .rest_options(&GroupResource::new("", "configmaps"))
            .unwrap();
        assert_eq!(core.resource_prefix, "/registry/configmaps");
        assert_eq!(core.backend.name(), "memory");
    }
}
