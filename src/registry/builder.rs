//! StoreBuilder for composing a resource store

use super::store::{Store, StoreParts};
use crate::config::{RestOptions, RestOptionsGetter};
use crate::core::attributes::{AttributeExtractor, default_attributes};
use crate::core::descriptor::ResourceInfo;
use crate::core::error::StoreError;
use crate::core::meta::Resource;
use crate::core::strategy::{CreateStrategy, DeleteStrategy, Strategy, UpdateStrategy};
use crate::core::table::{TableConverter, TableConvertor};
use std::sync::Arc;

/// Options the builder completes a store with
pub struct StoreOptions<T: Resource> {
    pub rest_options: Arc<dyn RestOptionsGetter>,
    pub attr_fn: Arc<dyn AttributeExtractor<T>>,
}

impl<T: Resource> StoreOptions<T> {
    /// Options with [`default_attributes`] as the attribute extractor
    pub fn new(rest_options: impl RestOptionsGetter + 'static) -> Self {
        Self::from_arc(Arc::new(rest_options))
    }

    pub fn from_arc(rest_options: Arc<dyn RestOptionsGetter>) -> Self {
        Self {
            rest_options,
            attr_fn: Arc::new(default_attributes::<T>),
        }
    }

    pub fn with_attr_fn(mut self, attr_fn: impl AttributeExtractor<T> + 'static) -> Self {
        self.attr_fn = Arc::new(attr_fn);
        self
    }
}

/// Builder wiring a descriptor, strategies and a table convertor into a [`Store`]
///
/// # Example
///
/// ```ignore
/// let store = StoreBuilder::new(external_name::resource_info())
///     .with_strategy(ExternalNameStrategy::new())
///     .with_table_convertor(external_name::table_converter())
///     .complete_with_options(StoreOptions::from_arc(getter).with_attr_fn(external_name::attributes))?;
/// ```
pub struct StoreBuilder<T: Resource> {
    info: ResourceInfo<T>,
    create_strategy: Option<Arc<dyn CreateStrategy<T>>>,
    update_strategy: Option<Arc<dyn UpdateStrategy<T>>>,
    delete_strategy: Option<Arc<dyn DeleteStrategy<T>>>,
    table_convertor: Option<Arc<dyn TableConvertor>>,
}

impl<T: Resource> StoreBuilder<T> {
    pub fn new(info: ResourceInfo<T>) -> Self {
        Self {
            info,
            create_strategy: None,
            update_strategy: None,
            delete_strategy: None,
            table_convertor: None,
        }
    }

    /// Use one strategy for create, update and delete
    pub fn with_strategy(self, strategy: impl Strategy<T> + 'static) -> Self {
        let strategy = Arc::new(strategy);
        self.with_create_strategy_arc(strategy.clone())
            .with_update_strategy_arc(strategy.clone())
            .with_delete_strategy_arc(strategy)
    }

    pub fn with_create_strategy(self, strategy: impl CreateStrategy<T> + 'static) -> Self {
        self.with_create_strategy_arc(Arc::new(strategy))
    }

    pub fn with_update_strategy(self, strategy: impl UpdateStrategy<T> + 'static) -> Self {
        self.with_update_strategy_arc(Arc::new(strategy))
    }

    pub fn with_delete_strategy(self, strategy: impl DeleteStrategy<T> + 'static) -> Self {
        self.with_delete_strategy_arc(Arc::new(strategy))
    }

    /// Defaults to [`TableConverter::with_default_columns`] when unset
    pub fn with_table_convertor(mut self, convertor: impl TableConvertor + 'static) -> Self {
        self.table_convertor = Some(Arc::new(convertor));
        self
    }

    fn with_create_strategy_arc(mut self, strategy: Arc<dyn CreateStrategy<T>>) -> Self {
        self.create_strategy = Some(strategy);
        self
    }

    fn with_update_strategy_arc(mut self, strategy: Arc<dyn UpdateStrategy<T>>) -> Self {
        self.update_strategy = Some(strategy);
        self
    }

    fn with_delete_strategy_arc(mut self, strategy: Arc<dyn DeleteStrategy<T>>) -> Self {
        self.delete_strategy = Some(strategy);
        self
    }

    /// Validate the composition and produce the store
    ///
    /// Fails with [`StoreError::Misconfigured`] when the descriptor is
    /// incomplete, a strategy is missing, a strategy's scope disagrees with
    /// the descriptor, or the REST options are unusable.
    pub fn complete_with_options(self, options: StoreOptions<T>) -> Result<Store<T>, StoreError> {
        self.info.check()?;
        let resource = self.info.group_resource();

        let create_strategy = self.create_strategy.ok_or_else(|| {
            StoreError::misconfigured(format!("{} must have a create strategy", resource))
        })?;
        let update_strategy = self.update_strategy.ok_or_else(|| {
            StoreError::misconfigured(format!("{} must have an update strategy", resource))
        })?;
        let delete_strategy = self.delete_strategy.ok_or_else(|| {
            StoreError::misconfigured(format!("{} must have a delete strategy", resource))
        })?;

        let namespaced = self.info.namespaced();
        if create_strategy.namespace_scoped() != namespaced {
            return Err(StoreError::misconfigured(format!(
                "{} create strategy scope does not match the resource (namespaced: {})",
                resource, namespaced
            )));
        }
        if update_strategy.namespace_scoped() != namespaced {
            return Err(StoreError::misconfigured(format!(
                "{} update strategy scope does not match the resource (namespaced: {})",
                resource, namespaced
            )));
        }

        let RestOptions {
            backend,
            resource_prefix,
            max_list_limit,
        } = options.rest_options.rest_options(&resource)?;

        if resource_prefix.is_empty()
            || !resource_prefix.starts_with('/')
            || resource_prefix.ends_with('/')
        {
            return Err(StoreError::misconfigured(format!(
                "{} has an invalid key prefix '{}'",
                resource, resource_prefix
            )));
        }
        if max_list_limit == 0 {
            return Err(StoreError::misconfigured(format!(
                "{} max_list_limit must be greater than zero",
                resource
            )));
        }

        let table_convertor = self
            .table_convertor
            .unwrap_or_else(|| Arc::new(TableConverter::<T>::with_default_columns(resource.clone())));

        tracing::info!(
            resource = %resource,
            kind = %self.info.kind(),
            version = %self.info.group_version(),
            namespaced,
            prefix = %resource_prefix,
            backend = %backend.name(),
            "store composed"
        );

        Ok(Store::from_parts(StoreParts {
            info: self.info,
            create_strategy,
            update_strategy,
            delete_strategy,
            attr_fn: options.attr_fn,
            table_convertor,
            backend,
            prefix: resource_prefix,
            max_list_limit,
        }))
    }
}
