//! Typed errors for store composition and store operations
//!
//! # Error Categories
//!
//! - [`StoreError::Misconfigured`]: the store was wired incorrectly; fatal at startup
//! - [`StoreError::ValidationRejected`]: a strategy rejected the object; nothing was persisted
//! - [`StoreError::Forbidden`]: a delete strategy refused the operation
//! - [`StoreError::TypeMismatch`]: a table convertor received an object of another kind
//! - [`StoreError::MalformedRow`]: a row function returned the wrong number of cells
//! - [`StoreError::NotFound`], [`StoreError::AlreadyExists`], [`StoreError::Conflict`]:
//!   outcomes reported by the storage engine
//! - [`StorageError`]: backend failures
//!
//! # Example
//!
//! ```rust,ignore
//! match store.get("default", "svc-a").await {
//!     Ok(obj) => println!("found {}", obj.metadata.name),
//!     Err(StoreError::NotFound { name, .. }) => println!("{} is gone", name),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use crate::core::validation::FieldErrors;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The error type returned by every store operation
#[derive(Debug)]
pub enum StoreError {
    /// Composition failed; the store must not serve requests
    Misconfigured { message: String },

    /// The object failed strategy validation
    ValidationRejected {
        kind: String,
        name: String,
        errors: FieldErrors,
    },

    /// The operation is not allowed on this object
    Forbidden {
        kind: String,
        name: String,
        message: String,
    },

    /// An object of an unexpected concrete type reached a typed component
    TypeMismatch {
        resource: String,
        expected: String,
        actual: String,
    },

    /// A rendered table row does not fit the column schema
    MalformedRow {
        resource: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    /// No object is stored under the requested identity
    NotFound { resource: String, name: String },

    /// An object already exists under the requested identity
    AlreadyExists { resource: String, name: String },

    /// A precondition or resource version did not match the stored object
    Conflict {
        resource: String,
        name: String,
        message: String,
    },

    /// Malformed request input (selectors, continue tokens, identities)
    BadRequest { message: String },

    /// Backend failure
    Storage(StorageError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Misconfigured { message } => {
                write!(f, "Store misconfigured: {}", message)
            }
            StoreError::ValidationRejected { kind, name, errors } => {
                write!(f, "{} \"{}\" is invalid: {}", kind, name, errors)
            }
            StoreError::Forbidden {
                kind,
                name,
                message,
            } => {
                write!(f, "{} \"{}\" is forbidden: {}", kind, name, message)
            }
            StoreError::TypeMismatch {
                resource,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Type mismatch for {}: expected {}, got {}",
                    resource, expected, actual
                )
            }
            StoreError::MalformedRow {
                resource,
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "table row for {} \"{}\" has {} cells, expected {}",
                    resource, name, actual, expected
                )
            }
            StoreError::NotFound { resource, name } => {
                write!(f, "{} \"{}\" not found", resource, name)
            }
            StoreError::AlreadyExists { resource, name } => {
                write!(f, "{} \"{}\" already exists", resource, name)
            }
            StoreError::Conflict {
                resource,
                name,
                message,
            } => {
                write!(
                    f,
                    "Operation cannot be fulfilled on {} \"{}\": {}",
                    resource, name, message
                )
            }
            StoreError::BadRequest { message } => write!(f, "Bad request: {}", message),
            StoreError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response structure for HTTP front ends
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl StoreError {
    pub fn misconfigured(message: impl Into<String>) -> Self {
        StoreError::Misconfigured {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        StoreError::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::ValidationRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
            StoreError::TypeMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::MalformedRow { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
            StoreError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Misconfigured { .. } => "MISCONFIGURED_COMPOSITION",
            StoreError::ValidationRejected { .. } => "VALIDATION_REJECTED",
            StoreError::Forbidden { .. } => "FORBIDDEN",
            StoreError::TypeMismatch { .. } => "TYPE_MISMATCH",
            StoreError::MalformedRow { .. } => "MALFORMED_TABLE_ROW",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::AlreadyExists { .. } => "ALREADY_EXISTS",
            StoreError::Conflict { .. } => "CONFLICT",
            StoreError::BadRequest { .. } => "BAD_REQUEST",
            StoreError::Storage(e) => e.error_code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::AlreadyExists { .. }
        )
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::ValidationRejected { kind, name, errors } => Some(serde_json::json!({
                "kind": kind,
                "name": name,
                "causes": errors,
            })),
            StoreError::NotFound { resource, name }
            | StoreError::AlreadyExists { resource, name }
            | StoreError::Conflict { resource, name, .. } => Some(serde_json::json!({
                "resource": resource,
                "name": name,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Create on a key that is already taken
    KeyExists { key: String },

    /// Update or delete on a key that does not exist
    KeyNotFound { key: String },

    /// Compare-and-swap failed
    RevisionMismatch {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// A stored document could not be (de)serialized
    Serialization { message: String },

    /// Internal lock was poisoned by a panicking writer
    LockPoisoned { message: String },

    /// A watcher fell behind the change feed and missed events
    WatchLagged { skipped: u64 },

    /// Backend not available
    Unavailable { backend: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::KeyExists { key } => write!(f, "Key '{}' already exists", key),
            StorageError::KeyNotFound { key } => write!(f, "Key '{}' not found", key),
            StorageError::RevisionMismatch {
                key,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Revision mismatch on '{}': expected {}, found {}",
                    key, expected, actual
                )
            }
            StorageError::Serialization { message } => {
                write!(f, "Failed to serialize/deserialize stored object: {}", message)
            }
            StorageError::LockPoisoned { message } => {
                write!(f, "Storage lock poisoned: {}", message)
            }
            StorageError::WatchLagged { skipped } => {
                write!(f, "Watch fell behind and skipped {} events", skipped)
            }
            StorageError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::KeyExists { .. } => "STORAGE_KEY_EXISTS",
            StorageError::KeyNotFound { .. } => "STORAGE_KEY_NOT_FOUND",
            StorageError::RevisionMismatch { .. } => "STORAGE_REVISION_MISMATCH",
            StorageError::Serialization { .. } => "STORAGE_SERIALIZATION_ERROR",
            StorageError::LockPoisoned { .. } => "STORAGE_LOCK_POISONED",
            StorageError::WatchLagged { .. } => "STORAGE_WATCH_LAGGED",
            StorageError::Unavailable { .. } => "STORAGE_UNAVAILABLE",
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Storage(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

/// A specialized Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
