//! Versioned cache of validation outcomes.
//!
//! The reconciler keeps two instances: one that survives across passes and records
//! which revision of each object was validated, and one rebuilt each pass that records
//! which objects were observed at all. Keys present in the first but not in the second
//! at the end of a pass belong to deleted objects.

use serde::Serialize;
use std::collections::HashMap;

use crate::cluster::DynamicObject;
use crate::validation::ValidationOutcome;

/// Unique identity of a logical object, independent of its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectKey {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn from_object(obj: &DynamicObject) -> Self {
        let gvk = obj.gvk();
        Self {
            group: gvk.group,
            version: gvk.version,
            kind: gvk.kind,
            namespace: obj.namespace().to_string(),
            name: obj.name().to_string(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
        }
    }
}

/// What the cache remembers about one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Revision the entry was recorded at.
    pub resource_version: String,
    /// Stable identifier of the object.
    pub uid: String,
    /// `None` for entries that only record presence.
    pub outcome: Option<ValidationOutcome>,
}

/// Result of comparing a cached entry against an object's current revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing cached for the key.
    Missing,
    /// Cached at a different revision; the entry must be evicted.
    Stale,
    /// Cached at the current revision.
    Fresh,
}

/// Map from object identity to the last seen revision and outcome.
///
/// Not synchronised: a cache is owned and mutated by exactly one reconciler.
#[derive(Debug, Clone, Default)]
pub struct VersionedCache {
    entries: HashMap<ObjectKey, CacheEntry>,
}

impl VersionedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry, replacing whatever was stored for `key`.
    pub fn store(
        &mut self,
        key: ObjectKey,
        resource_version: impl Into<String>,
        uid: impl Into<String>,
        outcome: Option<ValidationOutcome>,
    ) {
        self.entries.insert(
            key,
            CacheEntry {
                resource_version: resource_version.into(),
                uid: uid.into(),
                outcome,
            },
        );
    }

    /// Records `obj` at its current revision.
    pub fn store_object(&mut self, obj: &DynamicObject, outcome: Option<ValidationOutcome>) {
        self.store(
            ObjectKey::from_object(obj),
            obj.resource_version(),
            obj.uid(),
            outcome,
        );
    }

    pub fn has(&self, key: &ObjectKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn retrieve(&self, key: &ObjectKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Removes the entry for `key`; does nothing if there is none.
    pub fn remove(&mut self, key: &ObjectKey) {
        self.entries.remove(key);
    }

    /// Removes every entry.
    pub fn drain(&mut self) {
        self.entries.clear();
    }

    /// Compares the cached revision for `key` with `resource_version` without mutating.
    pub fn check(&self, key: &ObjectKey, resource_version: &str) -> Freshness {
        match self.entries.get(key) {
            None => Freshness::Missing,
            Some(entry) if entry.resource_version != resource_version => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// Evicts an entry found stale by [`check`](Self::check).
    pub fn evict(&mut self, key: &ObjectKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Returns true if `key` was already validated at `resource_version`.
    ///
    /// A stale entry is evicted, so a revision change always forces re-validation.
    pub fn already_evaluated(&mut self, key: &ObjectKey, resource_version: &str) -> bool {
        match self.check(key, resource_version) {
            Freshness::Fresh => true,
            Freshness::Missing => false,
            Freshness::Stale => {
                log::debug!("{} changed since last validation", key);
                self.evict(key);
                false
            }
        }
    }

    /// Keys present in this cache but absent from `live`, in key order.
    pub fn stale_against(&self, live: &VersionedCache) -> Vec<ObjectKey> {
        let mut stale: Vec<ObjectKey> = self
            .entries
            .keys()
            .filter(|key| !live.has(key))
            .cloned()
            .collect();
        stale.sort();
        stale
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
