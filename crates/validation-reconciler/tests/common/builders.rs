//! Builders for discovery entries and cluster objects.

#![allow(dead_code)]

use serde_json::json;

use validation_reconciler::{ApiResource, DynamicObject, GroupVersionKind, ObjectMeta};

pub fn deployment_gvk() -> GroupVersionKind {
    GroupVersionKind::new("apps", "v1", "Deployment")
}

pub fn service_gvk() -> GroupVersionKind {
    GroupVersionKind::new("", "v1", "Service")
}

pub fn pdb_gvk() -> GroupVersionKind {
    GroupVersionKind::new("policy", "v1", "PodDisruptionBudget")
}

pub fn cluster_role_gvk() -> GroupVersionKind {
    GroupVersionKind::new("rbac.authorization.k8s.io", "v1", "ClusterRole")
}

pub fn namespace_gvk() -> GroupVersionKind {
    GroupVersionKind::new("", "v1", "Namespace")
}

/// Discovery entry for `gvk` supporting the usual verbs.
pub fn api_resource(gvk: &GroupVersionKind, plural: &str, namespaced: bool) -> ApiResource {
    ApiResource {
        group: gvk.group.clone(),
        version: gvk.version.clone(),
        kind: gvk.kind.clone(),
        name: plural.to_string(),
        namespaced,
        verbs: vec!["get".into(), "list".into(), "watch".into()],
    }
}

/// Builder for [`DynamicObject`]s.
pub struct ObjectBuilder {
    gvk: GroupVersionKind,
    meta: ObjectMeta,
    spec: Option<serde_json::Value>,
}

impl ObjectBuilder {
    pub fn new(gvk: GroupVersionKind, name: &str) -> Self {
        let mut meta = ObjectMeta::new(name);
        meta.uid = format!("uid-{name}");
        meta.resource_version = "1".to_string();
        Self {
            gvk,
            meta,
            spec: None,
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.meta.namespace = namespace.to_string();
        self.meta.uid = format!("uid-{}-{}", namespace, self.meta.name);
        self
    }

    pub fn revision(mut self, resource_version: &str) -> Self {
        self.meta.resource_version = resource_version.to_string();
        self
    }

    pub fn uid(mut self, uid: &str) -> Self {
        self.meta.uid = uid.to_string();
        self
    }

    pub fn app(mut self, app: &str) -> Self {
        self.meta.labels.insert("app".to_string(), app.to_string());
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.meta.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn spec(mut self, spec: serde_json::Value) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn build(self) -> DynamicObject {
        let obj = DynamicObject::new(&self.gvk, self.meta);
        match self.spec {
            Some(spec) => obj.with_field("spec", spec),
            None => obj,
        }
    }
}

pub fn deployment(namespace: &str, name: &str, app: &str) -> DynamicObject {
    ObjectBuilder::new(deployment_gvk(), name)
        .namespace(namespace)
        .app(app)
        .spec(json!({ "replicas": 2 }))
        .build()
}

pub fn service(namespace: &str, name: &str, app: &str) -> DynamicObject {
    ObjectBuilder::new(service_gvk(), name)
        .namespace(namespace)
        .app(app)
        .spec(json!({ "selector": { "app": app } }))
        .build()
}

/// Disruption budget carrying its app label only in the selector.
pub fn pdb(namespace: &str, name: &str, app: &str) -> DynamicObject {
    ObjectBuilder::new(pdb_gvk(), name)
        .namespace(namespace)
        .spec(json!({ "minAvailable": 1, "selector": { "matchLabels": { "app": app } } }))
        .build()
}

pub fn cluster_role(name: &str) -> DynamicObject {
    ObjectBuilder::new(cluster_role_gvk(), name).build()
}

pub fn namespace(name: &str) -> DynamicObject {
    ObjectBuilder::new(namespace_gvk(), name)
        .uid(&format!("ns-uid-{name}"))
        .build()
}
