//! Watch events delivered to store subscribers
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut events = store.watch(&ListOptions::in_namespace("default")).await?;
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("{:?} {}", event.event_type, event.object.metadata.name);
//! }
//! ```

use crate::core::error::StoreError;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// The object was created, or started matching the watch's selectors
    Added,
    /// The object changed and still matches
    Modified,
    /// The object was deleted, or stopped matching the watch's selectors
    Deleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Added => "ADDED",
            EventType::Modified => "MODIFIED",
            EventType::Deleted => "DELETED",
        }
    }
}

/// One change to one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent<T> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub object: T,
}

impl<T> WatchEvent<T> {
    pub fn added(object: T) -> Self {
        Self {
            event_type: EventType::Added,
            object,
        }
    }

    pub fn modified(object: T) -> Self {
        Self {
            event_type: EventType::Modified,
            object,
        }
    }

    pub fn deleted(object: T) -> Self {
        Self {
            event_type: EventType::Deleted,
            object,
        }
    }
}

/// Long-lived, cancellable stream of watch events; drop it to stop watching
pub type WatchStream<T> = Pin<Box<dyn Stream<Item = Result<WatchEvent<T>, StoreError>> + Send>>;
