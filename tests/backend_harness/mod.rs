//! Shared test harness for storage backend testing
//!
//! Provides helpers for building documents and the `backend_tests!` macro
//! that checks any [`Backend`] against the full contract.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod backend_harness;
//! use backend_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod backend_tests;

use serde_json::{Value, json};

/// A stored document as the store would write it
pub fn document(namespace: &str, name: &str, host: &str) -> Value {
    json!({
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "host": host },
    })
}

/// Key for `name` in `namespace` under the harness prefix
pub fn key(namespace: &str, name: &str) -> String {
    format!("/harness/externalnames/{}/{}", namespace, name)
}

pub const PREFIX: &str = "/harness/externalnames/";
