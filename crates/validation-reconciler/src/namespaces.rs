//! Watch scope: which namespaces are reconciled, and their stable identifiers.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::cluster::{ClusterApi, ClusterError, GroupVersionKind, ListParams};

/// A namespace selected for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedNamespace {
    pub name: String,
    pub uid: String,
}

impl WatchedNamespace {
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
        }
    }
}

/// Supplies the namespaces to watch during a pass.
#[async_trait]
pub trait NamespaceScope: Send + Sync {
    /// Forgets the memoized namespace list so the next pass resolves it afresh.
    fn reset_cache(&mut self);

    /// Returns the watched namespaces in a stable order.
    async fn watch_namespaces(&mut self) -> Result<Vec<WatchedNamespace>, ClusterError>;

    /// Resolves a namespace name to its uid, or an empty string if unknown.
    fn namespace_uid(&self, name: &str) -> String;
}

/// [`NamespaceScope`] backed by listing `v1/Namespace` objects.
pub struct WatchNamespacesCache<C> {
    client: Arc<C>,
    page_size: u32,
    ignore_pattern: Option<Regex>,
    namespaces: Option<Vec<WatchedNamespace>>,
}

impl<C: ClusterApi> WatchNamespacesCache<C> {
    pub fn new(client: Arc<C>, page_size: u32, ignore_pattern: Option<Regex>) -> Self {
        Self {
            client,
            page_size,
            ignore_pattern,
            namespaces: None,
        }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(name))
    }

    async fn fetch(&self) -> Result<Vec<WatchedNamespace>, ClusterError> {
        let gvk = GroupVersionKind::new("", "v1", "Namespace");
        let mut params = ListParams {
            namespace: None,
            limit: self.page_size,
            continue_token: None,
        };
        let mut namespaces = Vec::new();

        loop {
            let page = self.client.list(&gvk, &params).await?;
            for item in page.items {
                if self.is_ignored(item.name()) {
                    log::debug!("Namespace '{}' matches ignore pattern, skipping", item.name());
                    continue;
                }
                namespaces.push(WatchedNamespace::new(
                    item.metadata.name,
                    item.metadata.uid,
                ));
            }
            if page.continue_token.is_empty() {
                break;
            }
            params.continue_token = Some(page.continue_token);
        }

        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        namespaces.dedup_by(|a, b| a.name == b.name);
        Ok(namespaces)
    }
}

#[async_trait]
impl<C: ClusterApi> NamespaceScope for WatchNamespacesCache<C> {
    fn reset_cache(&mut self) {
        self.namespaces = None;
    }

    async fn watch_namespaces(&mut self) -> Result<Vec<WatchedNamespace>, ClusterError> {
        if let Some(cached) = &self.namespaces {
            return Ok(cached.clone());
        }
        let namespaces = self.fetch().await?;
        log::debug!("Resolved {} watched namespaces", namespaces.len());
        self.namespaces = Some(namespaces.clone());
        Ok(namespaces)
    }

    fn namespace_uid(&self, name: &str) -> String {
        self.namespaces
            .as_ref()
            .and_then(|namespaces| namespaces.iter().find(|ns| ns.name == name))
            .map(|ns| ns.uid.clone())
            .unwrap_or_default()
    }
}
