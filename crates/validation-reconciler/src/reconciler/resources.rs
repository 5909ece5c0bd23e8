//! Resource enumeration: which kinds a pass lists, split by scope.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::cluster::{ApiResource, ClusterApi, ClusterError, GroupVersionKind, TypeScheme};

/// Kinds to reconcile during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSet {
    pub cluster_scoped: Vec<GroupVersionKind>,
    pub namespaced: Vec<GroupVersionKind>,
}

impl ResourceSet {
    /// Filters discovered resources and partitions them by scope.
    ///
    /// Subresources, kinds that cannot be listed and kinds without a registered
    /// typed shape are dropped; duplicates keep their first occurrence.
    pub fn from_discovery(resources: Vec<ApiResource>, scheme: &TypeScheme) -> Self {
        let mut seen = BTreeSet::new();
        let mut set = Self::default();

        for resource in resources {
            if resource.is_subresource() || !resource.supports("list") {
                continue;
            }
            let gvk = resource.gvk();
            if !scheme.recognizes(&gvk) {
                log::trace!("Skipping {}: no registered type", gvk);
                continue;
            }
            if !seen.insert(gvk.clone()) {
                continue;
            }
            if resource.namespaced {
                set.namespaced.push(gvk);
            } else {
                set.cluster_scoped.push(gvk);
            }
        }

        set
    }

    pub fn len(&self) -> usize {
        self.cluster_scoped.len() + self.namespaced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.cluster_scoped.iter().chain(self.namespaced.iter())
    }
}

/// Queries discovery and builds the [`ResourceSet`] for a pass.
pub async fn enumerate_resources<C>(
    client: &C,
    scheme: &TypeScheme,
) -> Result<ResourceSet, ClusterError>
where
    C: ClusterApi + ?Sized,
{
    let discovered = client.discover_resources().await?;
    let discovered_count = discovered.len();
    let set = ResourceSet::from_discovery(discovered, scheme);
    log::debug!(
        "Discovered {} resources, reconciling {} cluster scoped and {} namespaced kinds",
        discovered_count,
        set.cluster_scoped.len(),
        set.namespaced.len()
    );
    Ok(set)
}
