//! Contract consumed from the cluster's API server.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ApiResource, GroupVersionKind, ListParams, ObjectList};

/// Errors reported by a [`ClusterApi`] implementation.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Discovery request failed: {0}")]
    Discovery(String),

    #[error("List of {gvk} failed: {message}")]
    List {
        gvk: GroupVersionKind,
        message: String,
    },

    #[error("API server unavailable: {0}")]
    Unavailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Kind {0} is not served by the cluster")]
    NotServed(GroupVersionKind),

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClusterError {
    /// Returns true if the error is likely transient and the request can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClusterError::List { .. } | ClusterError::Unavailable(_) | ClusterError::Timeout(_)
        )
    }
}

/// Result type for cluster API calls.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Minimal view of the cluster API used by the reconciler.
///
/// Implementations are expected to be cheap to share (`Arc`) since both the
/// engine and the namespace scope issue list calls.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Returns every resource kind the server advertises.
    async fn discover_resources(&self) -> Result<Vec<ApiResource>>;

    /// Fetches one page of objects of the given kind.
    async fn list(&self, gvk: &GroupVersionKind, params: &ListParams) -> Result<ObjectList>;
}
