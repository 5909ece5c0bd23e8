//! Built-in typed shapes for the kinds the evaluation engine inspects most often.
//!
//! Fields the engine does not look at are kept as raw JSON values.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;

use super::scheme::{TypeScheme, TypedObject};
use super::types::{GroupVersionKind, ObjectMeta};

/// A generic K8s-style typed object wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedResource<T> {
    pub api_version: String,

    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: T,
}

impl<T> TypedObject for TypedResource<T>
where
    T: std::fmt::Debug + Send + Sync + 'static,
{
    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(&self.api_version, self.kind.clone())
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Label selector with equality-based requirements only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<serde_json::Value>,
}

// ============================================================================
// Workloads
// ============================================================================

/// Spec shared by Deployment, StatefulSet and DaemonSet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    #[serde(default)]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub selector: Option<LabelSelector>,

    /// Pod template, inspected by the evaluation engine as raw JSON.
    #[serde(default)]
    pub template: serde_json::Value,
}

pub type Deployment = TypedResource<WorkloadSpec>;

// ============================================================================
// Policy
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionBudgetSpec {
    /// Integer or percentage string.
    #[serde(default)]
    pub min_available: Option<serde_json::Value>,

    #[serde(default)]
    pub max_unavailable: Option<serde_json::Value>,

    #[serde(default)]
    pub selector: Option<LabelSelector>,
}

pub type PodDisruptionBudget = TypedResource<PodDisruptionBudgetSpec>;

// ============================================================================
// Core
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub selector: HashMap<String, String>,

    #[serde(default, rename = "type")]
    pub service_type: Option<String>,

    #[serde(default)]
    pub ports: Vec<serde_json::Value>,
}

pub type Service = TypedResource<ServiceSpec>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceSpec {
    #[serde(default)]
    pub finalizers: Vec<String>,
}

pub type Namespace = TypedResource<NamespaceSpec>;

// ============================================================================
// RBAC
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub api_groups: Vec<String>,

    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default)]
    pub verbs: Vec<String>,
}

/// ClusterRole carries its rules at the top level rather than under `spec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    pub api_version: String,

    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl TypedObject for ClusterRole {
    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(&self.api_version, self.kind.clone())
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registers every built-in shape.
pub fn register_builtin(scheme: &mut TypeScheme) {
    for kind in ["Deployment", "StatefulSet", "DaemonSet", "ReplicaSet"] {
        scheme.register::<Deployment>(GroupVersionKind::new("apps", "v1", kind));
    }
    scheme.register::<PodDisruptionBudget>(GroupVersionKind::new(
        "policy",
        "v1",
        "PodDisruptionBudget",
    ));
    scheme.register::<Service>(GroupVersionKind::new("", "v1", "Service"));
    scheme.register::<Namespace>(GroupVersionKind::new("", "v1", "Namespace"));
    scheme.register::<ClusterRole>(GroupVersionKind::new(
        "rbac.authorization.k8s.io",
        "v1",
        "ClusterRole",
    ));
}
