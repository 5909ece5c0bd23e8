//! Contract with the external policy/validation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::cache::ObjectKey;
use crate::cluster::{DynamicObject, TypedObject};

/// Result of evaluating one object or one batch of related objects.
///
/// The reconciler stores it per object and never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationOutcome {
    /// Every check passed.
    Valid,
    /// At least one check reported a finding.
    NeedsImprovement,
    /// The object opted out of validation.
    Ignored,
}

impl std::fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationOutcome::Valid => write!(f, "valid"),
            ValidationOutcome::NeedsImprovement => write!(f, "needs-improvement"),
            ValidationOutcome::Ignored => write!(f, "ignored"),
        }
    }
}

/// Errors reported by an [`Evaluator`].
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Validation of {kind} '{name}' failed: {message}")]
    Object {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Batch validation in namespace '{namespace_uid}' failed: {message}")]
    Batch {
        namespace_uid: String,
        message: String,
    },
}

/// Metric label set identifying one object's validation series.
pub type MetricLabels = BTreeMap<&'static str, String>;

/// Coordinates of one object submitted for single-object evaluation, also used to
/// address its metrics when they are retracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    /// Stable identifier of the namespace, empty when unresolved.
    pub namespace_uid: String,
    /// Stable identifier of the object itself.
    pub uid: String,
}

impl Request {
    pub fn from_object(obj: &DynamicObject) -> Self {
        Self {
            kind: obj.kind.clone(),
            name: obj.name().to_string(),
            namespace: obj.namespace().to_string(),
            namespace_uid: String::new(),
            uid: obj.uid().to_string(),
        }
    }

    /// Rebuilds a request for an object that is no longer observed.
    pub fn for_deleted(key: &ObjectKey, uid: &str, namespace_uid: String) -> Self {
        Self {
            kind: key.kind.clone(),
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            namespace_uid,
            uid: uid.to_string(),
        }
    }

    pub fn to_metric_labels(&self) -> MetricLabels {
        BTreeMap::from([
            ("namespace_uid", self.namespace_uid.clone()),
            ("namespace", self.namespace.clone()),
            ("uid", self.uid.clone()),
            ("name", self.name.clone()),
            ("kind", self.kind.clone()),
        ])
    }
}

/// The external evaluation engine.
pub trait Evaluator: Send + Sync {
    /// Evaluates a single object.
    fn evaluate_one(
        &self,
        request: &Request,
        object: &dyn TypedObject,
    ) -> Result<ValidationOutcome, EvaluationError>;

    /// Evaluates related objects of one namespace together.
    fn evaluate_batch(
        &self,
        objects: &[Box<dyn TypedObject>],
        namespace_uid: &str,
    ) -> Result<ValidationOutcome, EvaluationError>;

    /// Drops every metric series recorded for the object the labels address.
    fn retract_metrics(&self, labels: &MetricLabels);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{GroupVersionKind, ObjectMeta};

    #[test]
    fn test_request_from_object() {
        let mut meta = ObjectMeta::new("web");
        meta.namespace = "shop".into();
        meta.uid = "uid-1".into();
        let obj = DynamicObject::new(&GroupVersionKind::new("apps", "v1", "Deployment"), meta);

        let request = Request::from_object(&obj);
        assert_eq!(request.kind, "Deployment");
        assert_eq!(request.namespace, "shop");
        assert_eq!(request.uid, "uid-1");
        assert!(request.namespace_uid.is_empty());
    }

    #[test]
    fn test_metric_labels() {
        let request = Request {
            kind: "Service".into(),
            name: "api".into(),
            namespace: "shop".into(),
            namespace_uid: "ns-uid".into(),
            uid: "svc-uid".into(),
        };
        let labels = request.to_metric_labels();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels["namespace_uid"], "ns-uid");
        assert_eq!(labels["kind"], "Service");
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let json = serde_json::to_string(&ValidationOutcome::NeedsImprovement).unwrap();
        assert_eq!(json, "\"needsImprovement\"");
        assert_eq!(ValidationOutcome::Ignored.to_string(), "ignored");
    }
}
