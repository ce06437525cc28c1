//! Field-level validation errors and object metadata rules
//!
//! Strategies report problems as [`FieldErrors`]; the store turns a non-empty
//! set into [`StoreError::ValidationRejected`](crate::core::error::StoreError).

use crate::core::meta::ObjectMeta;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;
pub const LABEL_VALUE_MAX_LENGTH: usize = 63;

/// Category of a field error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Invalid,
    TooLong,
    Forbidden,
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Dotted path of the field, e.g. `metadata.name` or `spec.host`
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn required(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Required,
            message: "Required value".to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, value: &str, message: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Invalid,
            message: format!("Invalid value: \"{}\": {}", value, message),
        }
    }

    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::TooLong,
            message: format!("Too long: must have at most {} characters", max),
        }
    }

    pub fn forbidden(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Forbidden,
            message: format!("Forbidden: {}", message.into()),
        }
    }
}

/// An ordered collection of field errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// True when any error targets the given field path
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", msgs.join(", "))
    }
}

impl Extend<FieldError> for FieldErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn dns1123_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap())
}

fn dns1123_subdomain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
    })
}

fn qualified_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap())
}

/// Problems with `value` as a DNS-1123 subdomain; empty when valid
pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        problems.push(format!(
            "must be no more than {} characters",
            DNS1123_SUBDOMAIN_MAX_LENGTH
        ));
    }
    if !dns1123_subdomain_regex().is_match(value) {
        problems.push(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character".to_string(),
        );
    }
    problems
}

/// Problems with `value` as a DNS-1123 label; empty when valid
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        problems.push(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    if !dns1123_label_regex().is_match(value) {
        problems.push(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character".to_string(),
        );
    }
    problems
}

/// Problems with `key` as a label key (`[prefix/]name`); empty when valid
pub fn is_qualified_name(key: &str) -> Vec<String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    let mut problems = Vec::new();
    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            problems.push("prefix part must be non-empty".to_string());
        } else {
            problems.extend(
                is_dns1123_subdomain(prefix)
                    .into_iter()
                    .map(|p| format!("prefix part {}", p)),
            );
        }
    }
    if name.is_empty() || name.len() > 63 {
        problems.push("name part must be non-empty and at most 63 characters".to_string());
    } else if !qualified_name_regex().is_match(name) {
        problems.push(
            "name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character".to_string(),
        );
    }
    problems
}

/// Problems with `value` as a label value; empty when valid
pub fn is_label_value(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    let mut problems = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        problems.push(format!(
            "must be no more than {} characters",
            LABEL_VALUE_MAX_LENGTH
        ));
    }
    if !qualified_name_regex().is_match(value) {
        problems.push(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character".to_string(),
        );
    }
    problems
}

/// Validate the caller-owned parts of object metadata
pub fn validate_object_meta(meta: &ObjectMeta, namespaced: bool) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if meta.name.is_empty() {
        if meta.generate_name.is_empty() {
            errors.push(FieldError::required("metadata.name"));
        }
    } else {
        for problem in is_dns1123_subdomain(&meta.name) {
            errors.push(FieldError::invalid("metadata.name", &meta.name, problem));
        }
    }

    if namespaced {
        if meta.namespace.is_empty() {
            errors.push(FieldError::required("metadata.namespace"));
        } else {
            for problem in is_dns1123_label(&meta.namespace) {
                errors.push(FieldError::invalid(
                    "metadata.namespace",
                    &meta.namespace,
                    problem,
                ));
            }
        }
    } else if !meta.namespace.is_empty() {
        errors.push(FieldError::forbidden(
            "metadata.namespace",
            "not allowed on this type",
        ));
    }

    for (key, value) in &meta.labels {
        for problem in is_qualified_name(key) {
            errors.push(FieldError::invalid("metadata.labels", key, problem));
        }
        for problem in is_label_value(value) {
            errors.push(FieldError::invalid(
                format!("metadata.labels[{}]", key),
                value,
                problem,
            ));
        }
    }

    errors
}
