//! The generic store engine
//!
//! A [`Store<T>`] implements create/get/list/update/delete/watch for one
//! resource kind on top of a resource-agnostic [`Backend`]. Everything
//! kind-specific reaches it through the pieces wired in by the
//! [`StoreBuilder`](super::StoreBuilder): strategies around mutations, the
//! attribute extractor for selectors, and the table convertor for display.

use crate::core::attributes::AttributeExtractor;
use crate::core::descriptor::{GroupResource, ResourceInfo};
use crate::core::error::{StorageError, StoreError};
use crate::core::events::{WatchEvent, WatchStream};
use crate::core::meta::{ListMeta, Resource, ResourceList};
use crate::core::options::{CreateOptions, DeleteOptions, ListOptions, UpdateOptions};
use crate::core::selector::SelectionPredicate;
use crate::core::strategy::{CreateStrategy, DeleteStrategy, UpdateStrategy};
use crate::core::table::{Table, TableColumnDefinition, TableConvertor, TableOptions, TableSource};
use crate::core::validation::{FieldError, FieldErrors};
use crate::storage::{Backend, ChangeEvent, ChangeKind};
use chrono::{SubsecRound, Utc};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use uuid::Uuid;

/// Longest name `generate_name` may produce
const MAX_GENERATED_NAME_LENGTH: usize = 63;
const GENERATED_SUFFIX_LENGTH: usize = 5;

const CONFLICT_MESSAGE: &str =
    "the object has been modified; please apply your changes to the latest version and try again";

pub(crate) struct StoreParts<T: Resource> {
    pub info: ResourceInfo<T>,
    pub create_strategy: Arc<dyn CreateStrategy<T>>,
    pub update_strategy: Arc<dyn UpdateStrategy<T>>,
    pub delete_strategy: Arc<dyn DeleteStrategy<T>>,
    pub attr_fn: Arc<dyn AttributeExtractor<T>>,
    pub table_convertor: Arc<dyn TableConvertor>,
    pub backend: Arc<dyn Backend>,
    pub prefix: String,
    pub max_list_limit: usize,
}

/// A composed resource store
///
/// Cheap to clone; clones share the same wiring and backend.
pub struct Store<T: Resource> {
    inner: Arc<StoreParts<T>>,
}

impl<T: Resource> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Resource> Store<T> {
    pub(crate) fn from_parts(parts: StoreParts<T>) -> Self {
        Self {
            inner: Arc::new(parts),
        }
    }

    // === Accessors ===

    pub fn descriptor(&self) -> &ResourceInfo<T> {
        &self.inner.info
    }

    pub fn group_resource(&self) -> GroupResource {
        self.inner.info.group_resource()
    }

    pub fn column_definitions(&self) -> &[TableColumnDefinition] {
        self.inner.table_convertor.column_definitions()
    }

    pub fn key_prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// A zero-valued instance from the descriptor's factory
    pub fn new_object(&self) -> Result<T, StoreError> {
        self.inner.info.new_object().ok_or_else(|| {
            StoreError::misconfigured(format!(
                "{} must have a new object factory",
                self.group_resource()
            ))
        })
    }

    /// An empty list from the descriptor's factory
    pub fn new_list(&self) -> ResourceList<T> {
        self.inner.info.new_list().unwrap_or_default()
    }

    // === Operations ===

    /// Persist a new object
    ///
    /// Stamps uid and creation timestamp, generates the name from
    /// `metadata.generate_name` when `metadata.name` is empty, then runs the
    /// create strategy. A rejected object is never persisted.
    pub async fn create(&self, mut obj: T, options: &CreateOptions) -> Result<T, StoreError> {
        {
            let meta = obj.metadata_mut();
            if meta.name.is_empty() && !meta.generate_name.is_empty() {
                meta.name = generate_name(&meta.generate_name);
            }
            if meta.name.is_empty() {
                let errors: FieldErrors =
                    std::iter::once(FieldError::required("metadata.name")).collect();
                return Err(self.rejected("", errors));
            }
            self.check_identity(&meta.namespace, &meta.name)?;
            meta.uid = Uuid::new_v4().to_string();
            meta.creation_timestamp = Some(Utc::now().trunc_subsecs(0));
            meta.resource_version.clear();
        }

        let strategy = &self.inner.create_strategy;
        strategy.prepare_for_create(&mut obj);
        self.reject_if_invalid(&obj, strategy.validate(&obj))?;

        let meta = obj.metadata();
        tracing::debug!(
            resource = %self.group_resource(),
            name = %meta.qualified_name(),
            dry_run = options.dry_run,
            "creating object"
        );
        if options.dry_run {
            return Ok(obj);
        }

        let key = self.key_for(&meta.namespace, &meta.name);
        let value = self.encode(&obj)?;
        let revision = self
            .inner
            .backend
            .create(&key, value)
            .await
            .map_err(|e| self.map_storage_error(e, &obj.metadata().name))?;

        obj.metadata_mut().resource_version = revision.to_string();
        Ok(obj)
    }

    /// Fetch one object by identity
    pub async fn get(&self, namespace: &str, name: &str) -> Result<T, StoreError> {
        self.check_identity(namespace, name)?;
        let key = self.key_for(namespace, name);
        let stored = self
            .inner
            .backend
            .get(&key)
            .await?
            .ok_or_else(|| self.not_found(name))?;
        self.decode(stored.value, stored.revision)
    }

    /// List objects matching the options' namespace and selectors
    pub async fn list(&self, options: &ListOptions) -> Result<ResourceList<T>, StoreError> {
        let predicate = self.predicate(options)?;
        let prefix = self.list_prefix(options.namespace.as_deref())?;
        let limit = options.effective_limit(self.inner.max_list_limit);

        if let Some(token) = &options.continue_token {
            if !token.starts_with(&prefix) {
                return Err(StoreError::bad_request(format!(
                    "continue token '{}' does not belong to this list",
                    token
                )));
            }
        }

        let page = self.inner.backend.list(&prefix).await?;
        let mut list = self.new_list();
        list.metadata = ListMeta {
            resource_version: page.revision.to_string(),
            ..Default::default()
        };

        let mut last_key = None;
        let mut remaining = 0u64;
        let start_after = options.continue_token.as_deref();
        for stored in page.items {
            if start_after.is_some_and(|token| stored.key.as_str() <= token) {
                continue;
            }
            let key = stored.key.clone();
            let obj = self.decode(stored.value, stored.revision)?;
            if !predicate.matches(&self.inner.attr_fn.attributes(&obj)) {
                continue;
            }
            if list.items.len() < limit {
                list.items.push(obj);
                last_key = Some(key);
            } else {
                remaining += 1;
            }
        }

        if remaining > 0 {
            list.metadata.continue_token = last_key;
            list.metadata.remaining_item_count = Some(remaining);
        }

        tracing::debug!(
            resource = %self.group_resource(),
            prefix = %prefix,
            items = list.items.len(),
            remaining,
            "listed objects"
        );
        Ok(list)
    }

    /// Replace an existing object
    ///
    /// A non-empty `metadata.resource_version` must equal the stored one.
    /// When the object does not exist it is created if the update strategy
    /// allows it, otherwise `NotFound` is returned.
    pub async fn update(&self, mut obj: T, options: &UpdateOptions) -> Result<T, StoreError> {
        let (namespace, name) = {
            let meta = obj.metadata();
            (meta.namespace.clone(), meta.name.clone())
        };
        if name.is_empty() {
            let errors: FieldErrors = std::iter::once(FieldError::required("metadata.name")).collect();
            return Err(self.rejected(&name, errors));
        }
        self.check_identity(&namespace, &name)?;

        let key = self.key_for(&namespace, &name);
        let Some(stored) = self.inner.backend.get(&key).await? else {
            if self.inner.update_strategy.allow_create_on_update() {
                tracing::debug!(
                    resource = %self.group_resource(),
                    name = %name,
                    "update of missing object falls through to create"
                );
                return self
                    .create(
                        obj,
                        &CreateOptions {
                            dry_run: options.dry_run,
                        },
                    )
                    .await;
            }
            return Err(self.not_found(&name));
        };
        let old = self.decode(stored.value, stored.revision)?;

        {
            let old_meta = old.metadata();
            let meta = obj.metadata_mut();
            if !meta.resource_version.is_empty() && meta.resource_version != old_meta.resource_version
            {
                return Err(self.conflict(&name, CONFLICT_MESSAGE));
            }
            meta.uid = old_meta.uid.clone();
            meta.creation_timestamp = old_meta.creation_timestamp;
            meta.generate_name = old_meta.generate_name.clone();
            meta.resource_version.clear();
        }

        let strategy = &self.inner.update_strategy;
        strategy.prepare_for_update(&mut obj, &old);
        self.reject_if_invalid(&obj, strategy.validate_update(&obj, &old))?;

        tracing::debug!(
            resource = %self.group_resource(),
            name = %obj.metadata().qualified_name(),
            dry_run = options.dry_run,
            "updating object"
        );
        if options.dry_run {
            obj.metadata_mut().resource_version = old.metadata().resource_version.clone();
            return Ok(obj);
        }

        let value = self.encode(&obj)?;
        let revision = self
            .inner
            .backend
            .update(&key, value, stored.revision)
            .await
            .map_err(|e| self.map_storage_error(e, &name))?;

        obj.metadata_mut().resource_version = revision.to_string();
        Ok(obj)
    }

    /// Remove an object and return its last state
    pub async fn delete(
        &self,
        namespace: &str,
        name: &str,
        options: &DeleteOptions,
    ) -> Result<T, StoreError> {
        self.check_identity(namespace, name)?;
        let key = self.key_for(namespace, name);
        let stored = self
            .inner
            .backend
            .get(&key)
            .await?
            .ok_or_else(|| self.not_found(name))?;
        let revision = stored.revision;
        let obj = self.decode(stored.value, revision)?;

        let meta = obj.metadata();
        if let Some(uid) = &options.preconditions.uid {
            if *uid != meta.uid {
                return Err(self.conflict(
                    name,
                    &format!(
                        "precondition failed: uid in precondition: {}, uid in object meta: {}",
                        uid, meta.uid
                    ),
                ));
            }
        }
        if let Some(rv) = &options.preconditions.resource_version {
            if *rv != meta.resource_version {
                return Err(self.conflict(
                    name,
                    &format!(
                        "precondition failed: resource version in precondition: {}, resource version in object meta: {}",
                        rv, meta.resource_version
                    ),
                ));
            }
        }

        self.inner.delete_strategy.check_delete(&obj)?;

        tracing::debug!(
            resource = %self.group_resource(),
            name = %meta.qualified_name(),
            dry_run = options.dry_run,
            "deleting object"
        );
        if options.dry_run {
            return Ok(obj);
        }

        self.inner
            .backend
            .delete(&key, Some(revision))
            .await
            .map_err(|e| self.map_storage_error(e, name))?;
        Ok(obj)
    }

    /// Stream changes to objects matching the options' namespace and selectors
    ///
    /// Selector transitions are reported from the watcher's point of view: an
    /// object that stops matching arrives as `Deleted`, one that starts
    /// matching as `Added`.
    pub async fn watch(&self, options: &ListOptions) -> Result<WatchStream<T>, StoreError> {
        let predicate = self.predicate(options)?;
        let prefix = self.list_prefix(options.namespace.as_deref())?;

        // Subscribe before reading the snapshot so no write falls in between.
        let receiver = self.inner.backend.watch();

        let mut initial = Vec::new();
        let since = if options.send_initial_events {
            let page = self.inner.backend.list(&prefix).await?;
            for stored in page.items {
                let obj = self.decode(stored.value, stored.revision)?;
                if predicate.matches(&self.inner.attr_fn.attributes(&obj)) {
                    initial.push(Ok(WatchEvent::added(obj)));
                }
            }
            page.revision
        } else {
            self.inner.backend.current_revision().await?
        };

        tracing::debug!(
            resource = %self.group_resource(),
            prefix = %prefix,
            since,
            initial = initial.len(),
            "starting watch"
        );

        let store = self.clone();
        let live = BroadcastStream::new(receiver).filter_map(move |item| {
            let result = match item {
                Ok(event) if event.revision > since && event.key.starts_with(&prefix) => {
                    store.translate(event, &predicate).transpose()
                }
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        resource = %store.group_resource(),
                        skipped,
                        "watcher lagged behind the change feed"
                    );
                    Some(Err(StoreError::Storage(StorageError::WatchLagged { skipped })))
                }
            };
            futures::future::ready(result)
        });

        let stream: WatchStream<T> = Box::pin(futures::stream::iter(initial).chain(live));
        Ok(stream)
    }

    /// Render an object or list under this kind's column schema
    pub fn convert_to_table(
        &self,
        source: TableSource<'_>,
        options: &TableOptions,
    ) -> Result<Table, StoreError> {
        self.inner.table_convertor.convert_to_table(source, options)
    }

    // === Internals ===

    /// Namespace present iff the kind is namespaced; neither part may split a key
    fn check_identity(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let resource = self.group_resource();
        if name.is_empty() {
            return Err(StoreError::bad_request(format!(
                "a name is required for {}",
                resource
            )));
        }
        if self.inner.info.namespaced() {
            if namespace.is_empty() {
                return Err(StoreError::bad_request(format!(
                    "a namespace is required for {} \"{}\"",
                    resource, name
                )));
            }
        } else if !namespace.is_empty() {
            return Err(StoreError::bad_request(format!(
                "{} is cluster-scoped; namespace \"{}\" is not allowed",
                resource, namespace
            )));
        }
        for (what, value) in [("namespace", namespace), ("name", name)] {
            if value.contains('/') {
                return Err(StoreError::bad_request(format!(
                    "{} \"{}\" may not contain '/'",
                    what, value
                )));
            }
        }
        Ok(())
    }

    fn key_for(&self, namespace: &str, name: &str) -> String {
        if self.inner.info.namespaced() {
            format!("{}/{}/{}", self.inner.prefix, namespace, name)
        } else {
            format!("{}/{}", self.inner.prefix, name)
        }
    }

    fn list_prefix(&self, namespace: Option<&str>) -> Result<String, StoreError> {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) if ns.contains('/') => Err(StoreError::bad_request(format!(
                "namespace \"{}\" may not contain '/'",
                ns
            ))),
            Some(ns) if self.inner.info.namespaced() => {
                Ok(format!("{}/{}/", self.inner.prefix, ns))
            }
            _ => Ok(format!("{}/", self.inner.prefix)),
        }
    }

    fn predicate(&self, options: &ListOptions) -> Result<SelectionPredicate, StoreError> {
        SelectionPredicate::parse(
            options.label_selector.as_deref(),
            options.field_selector.as_deref(),
        )
        .map_err(|e| StoreError::bad_request(e.to_string()))
    }

    /// Serialize for the backend; the revision lives outside the document
    fn encode(&self, obj: &T) -> Result<Value, StoreError> {
        let mut value = serde_json::to_value(obj)?;
        if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.remove("resourceVersion");
        }
        Ok(value)
    }

    /// Deserialize a stored document and stamp the revision it was read at
    fn decode(&self, value: Value, revision: u64) -> Result<T, StoreError> {
        let mut obj: T = serde_json::from_value(value)?;
        obj.metadata_mut().resource_version = revision.to_string();
        Ok(obj)
    }

    fn translate(
        &self,
        event: ChangeEvent,
        predicate: &SelectionPredicate,
    ) -> Result<Option<WatchEvent<T>>, StoreError> {
        let obj = self.decode(event.value, event.revision)?;
        let matches = predicate.matches(&self.inner.attr_fn.attributes(&obj));

        let translated = match event.kind {
            ChangeKind::Created => matches.then(|| WatchEvent::added(obj)),
            ChangeKind::Deleted => matches.then(|| WatchEvent::deleted(obj)),
            ChangeKind::Updated => {
                let matched_before = match event.prev_value {
                    Some(prev) if !predicate.is_empty() => {
                        let prev: T = match event.prev_revision {
                            Some(revision) => self.decode(prev, revision)?,
                            None => serde_json::from_value(prev)?,
                        };
                        predicate.matches(&self.inner.attr_fn.attributes(&prev))
                    }
                    Some(_) => true,
                    None => false,
                };
                match (matched_before, matches) {
                    (true, true) => Some(WatchEvent::modified(obj)),
                    (false, true) => Some(WatchEvent::added(obj)),
                    (true, false) => Some(WatchEvent::deleted(obj)),
                    (false, false) => None,
                }
            }
        };
        Ok(translated)
    }

    fn reject_if_invalid(&self, obj: &T, errors: FieldErrors) -> Result<(), StoreError> {
        if errors.is_empty() {
            return Ok(());
        }
        let name = &obj.metadata().name;
        tracing::debug!(
            resource = %self.group_resource(),
            name = %name,
            errors = %errors,
            "object rejected by strategy"
        );
        Err(self.rejected(name, errors))
    }

    fn rejected(&self, name: &str, errors: FieldErrors) -> StoreError {
        StoreError::ValidationRejected {
            kind: self.inner.info.kind().to_string(),
            name: name.to_string(),
            errors,
        }
    }

    fn not_found(&self, name: &str) -> StoreError {
        StoreError::NotFound {
            resource: self.group_resource().to_string(),
            name: name.to_string(),
        }
    }

    fn conflict(&self, name: &str, message: &str) -> StoreError {
        StoreError::Conflict {
            resource: self.group_resource().to_string(),
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    fn map_storage_error(&self, err: StorageError, name: &str) -> StoreError {
        match err {
            StorageError::KeyExists { .. } => StoreError::AlreadyExists {
                resource: self.group_resource().to_string(),
                name: name.to_string(),
            },
            StorageError::KeyNotFound { .. } => self.not_found(name),
            StorageError::RevisionMismatch { .. } => self.conflict(name, CONFLICT_MESSAGE),
            other => StoreError::Storage(other),
        }
    }
}

impl<T: Resource> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("resource", &self.group_resource().to_string())
            .field("prefix", &self.inner.prefix)
            .field("backend", &self.inner.backend.name())
            .finish()
    }
}

/// `base` plus a random lower-case alphanumeric suffix, within name length limits
fn generate_name(base: &str) -> String {
    let max_base = MAX_GENERATED_NAME_LENGTH - GENERATED_SUFFIX_LENGTH;
    let base: String = base.chars().take(max_base).collect();
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_SUFFIX_LENGTH)
        .collect();
    format!("{}{}", base, suffix)
}
