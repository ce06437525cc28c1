//! In-memory backend for testing and development

use crate::core::error::StorageError;
use crate::storage::backend::{Backend, ChangeEvent, ChangeFeed, ChangeKind, ListPage, StoredObject};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    revision: u64,
}

/// In-memory backend implementation
///
/// Keys are kept in a `BTreeMap` so prefix scans come back sorted. Every write
/// bumps a single global revision and is published on the change feed while
/// the write lock is held, so watchers observe writes in revision order.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    feed: ChangeFeed,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_watch_capacity(1024)
    }

    /// Create a backend whose watchers buffer up to `capacity` events
    pub fn with_watch_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            feed: ChangeFeed::new(capacity),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StorageError> {
        self.state.read().map_err(|e| StorageError::LockPoisoned {
            message: format!("Failed to acquire read lock: {}", e),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StorageError> {
        self.state.write().map_err(|e| StorageError::LockPoisoned {
            message: format!("Failed to acquire write lock: {}", e),
        })
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, key: &str, value: Value) -> Result<u64, StorageError> {
        let mut state = self.write()?;
        if state.objects.contains_key(key) {
            return Err(StorageError::KeyExists {
                key: key.to_string(),
            });
        }

        state.revision += 1;
        let revision = state.revision;
        state.objects.insert(
            key.to_string(),
            StoredObject {
                key: key.to_string(),
                revision,
                value: value.clone(),
            },
        );

        self.feed.publish(ChangeEvent {
            kind: ChangeKind::Created,
            key: key.to_string(),
            revision,
            value,
            prev_value: None,
            prev_revision: None,
        });

        Ok(revision)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let state = self.read()?;
        Ok(state.objects.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<ListPage, StorageError> {
        let state = self.read()?;
        let items = state
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, obj)| obj.clone())
            .collect();

        Ok(ListPage {
            items,
            revision: state.revision,
        })
    }

    async fn update(
        &self,
        key: &str,
        value: Value,
        expected_revision: u64,
    ) -> Result<u64, StorageError> {
        let mut state = self.write()?;
        let current = state
            .objects
            .get(key)
            .ok_or_else(|| StorageError::KeyNotFound {
                key: key.to_string(),
            })?;

        if current.revision != expected_revision {
            return Err(StorageError::RevisionMismatch {
                key: key.to_string(),
                expected: expected_revision,
                actual: current.revision,
            });
        }
        let prev_value = current.value.clone();
        let prev_revision = current.revision;

        state.revision += 1;
        let revision = state.revision;
        state.objects.insert(
            key.to_string(),
            StoredObject {
                key: key.to_string(),
                revision,
                value: value.clone(),
            },
        );

        self.feed.publish(ChangeEvent {
            kind: ChangeKind::Updated,
            key: key.to_string(),
            revision,
            value,
            prev_value: Some(prev_value),
            prev_revision: Some(prev_revision),
        });

        Ok(revision)
    }

    async fn delete(
        &self,
        key: &str,
        expected_revision: Option<u64>,
    ) -> Result<StoredObject, StorageError> {
        let mut state = self.write()?;
        let current_revision = state
            .objects
            .get(key)
            .map(|obj| obj.revision)
            .ok_or_else(|| StorageError::KeyNotFound {
                key: key.to_string(),
            })?;

        if let Some(expected) = expected_revision.filter(|r| *r != current_revision) {
            return Err(StorageError::RevisionMismatch {
                key: key.to_string(),
                expected,
                actual: current_revision,
            });
        }

        let removed = state
            .objects
            .remove(key)
            .ok_or_else(|| StorageError::KeyNotFound {
                key: key.to_string(),
            })?;
        state.revision += 1;

        self.feed.publish(ChangeEvent {
            kind: ChangeKind::Deleted,
            key: key.to_string(),
            revision: state.revision,
            value: removed.value.clone(),
            prev_value: None,
            prev_revision: None,
        });

        Ok(removed)
    }

    async fn current_revision(&self) -> Result<u64, StorageError> {
        Ok(self.read()?.revision)
    }

    fn watch(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
