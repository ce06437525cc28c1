//! Resource-agnostic persistence contract
//!
//! A [`Backend`] stores JSON documents under string keys and assigns every
//! write a monotonically increasing revision. It knows nothing about resource
//! kinds: the [`Store`](crate::registry::Store) owns key layout, encoding and
//! all resource semantics.
//!
//! # Change feed
//!
//! ```text
//! create/update/delete ──▶ ChangeFeed::publish() ──▶ broadcast channel ──▶ Store::watch streams
//! ```

use crate::core::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// A document as persisted, with the revision of its last write
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub revision: u64,
    pub value: Value,
}

/// Snapshot of every document under a prefix, sorted by key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<StoredObject>,
    /// Backend revision the snapshot was taken at
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One write, as seen by watchers
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub key: String,
    pub revision: u64,
    /// New document, or the last state for deletes
    pub value: Value,
    /// Document before an update
    pub prev_value: Option<Value>,
    /// Revision `prev_value` was stored at
    pub prev_revision: Option<u64>,
}

/// Broadcast channel carrying backend changes
///
/// Cheap to clone; slow receivers get `Lagged` on their next receive.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to all subscribers; returns how many will receive it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        // send() only fails when nobody is subscribed
        self.sender.send(event).unwrap_or(0)
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Persistence engine behind every store
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Insert a new document; fails with `KeyExists` if the key is taken
    async fn create(&self, key: &str, value: Value) -> Result<u64, StorageError>;

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;

    /// All documents whose key starts with `prefix`, ascending by key
    async fn list(&self, prefix: &str) -> Result<ListPage, StorageError>;

    /// Replace a document if its revision still equals `expected_revision`
    async fn update(
        &self,
        key: &str,
        value: Value,
        expected_revision: u64,
    ) -> Result<u64, StorageError>;

    /// Remove a document, optionally guarded by its revision; returns its last state
    async fn delete(
        &self,
        key: &str,
        expected_revision: Option<u64>,
    ) -> Result<StoredObject, StorageError>;

    /// Revision of the most recent write
    async fn current_revision(&self) -> Result<u64, StorageError>;

    /// Subscribe to every change made after this call
    fn watch(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(key: &str, revision: u64) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Created,
            key: key.to_string(),
            revision,
            value: json!({}),
            prev_value: None,
            prev_revision: None,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new(4);
        assert_eq!(feed.publish(event("/a", 1)), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let feed = ChangeFeed::new(4);
        let mut rx = feed.subscribe();
        assert_eq!(feed.receiver_count(), 1);

        feed.publish(event("/a", 1));
        feed.publish(event("/b", 2));

        assert_eq!(rx.recv().await.unwrap().revision, 1);
        assert_eq!(rx.recv().await.unwrap().key, "/b");
    }

    #[tokio::test]
    async fn test_lagging_subscriber() {
        let feed = ChangeFeed::new(1);
        let mut rx = feed.subscribe();

        feed.publish(event("/a", 1));
        feed.publish(event("/b", 2));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().revision, 2);
    }
}
