//! Per-call options for store operations

use serde::Deserialize;

/// Options for list and watch calls
///
/// # Example
/// ```rust,ignore
/// let page = store
///     .list(
///         &ListOptions::in_namespace("default")
///             .with_label_selector("app=web")
///             .with_limit(50),
///     )
///     .await?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOptions {
    /// Restrict to one namespace; ignored for cluster-scoped kinds
    pub namespace: Option<String>,

    pub label_selector: Option<String>,

    pub field_selector: Option<String>,

    /// Page size; `None` or 0 returns everything (bounded by the store's max)
    pub limit: Option<usize>,

    /// Token from a previous page's `ListMeta::continue_token`
    #[serde(rename = "continue")]
    pub continue_token: Option<String>,

    /// Watch only: emit `Added` for every current match before live events
    pub send_initial_events: bool,
}

impl ListOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn with_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    pub fn with_field_selector(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_continue(mut self, token: impl Into<String>) -> Self {
        self.continue_token = Some(token.into());
        self
    }

    pub fn with_initial_events(mut self) -> Self {
        self.send_initial_events = true;
        self
    }

    /// Page size clamped to `max`; always at least 1
    pub fn effective_limit(&self, max: usize) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(max).max(1),
            _ => max.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOptions {
    /// Run defaulting and validation without persisting
    pub dry_run: bool,
}

impl CreateOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateOptions {
    /// Run defaulting and validation without persisting
    pub dry_run: bool,
}

impl UpdateOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Conditions the stored object must satisfy for a delete to proceed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preconditions {
    pub uid: Option<String>,
    pub resource_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteOptions {
    pub dry_run: bool,
    pub preconditions: Preconditions,
}

impl DeleteOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.preconditions.uid = Some(uid.into());
        self
    }

    pub fn with_resource_version(mut self, resource_version: impl Into<String>) -> Self {
        self.preconditions.resource_version = Some(resource_version.into());
        self
    }
}
