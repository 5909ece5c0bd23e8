//! In-memory cluster and evaluation engine for reconciler tests.
//!
//! - `FakeCluster` serves discovery and paginated lists from shared state that
//!   tests can change between passes, and records every list request.
//! - `RecordingEvaluator` records every call made by the reconciler.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use validation_reconciler::cluster::shapes::register_builtin;
use validation_reconciler::reconciler::BackoffPolicy;
use validation_reconciler::{
    ApiResource, ClusterApi, ClusterError, DynamicObject, EvaluationError, Evaluator,
    GenericReconciler, GroupVersionKind, ListParams, MetricLabels, ObjectList, ReconcilerConfig,
    Request, TypeScheme, TypedObject, ValidationOutcome, WatchNamespacesCache,
};

use super::builders;

#[derive(Default)]
struct ClusterState {
    resources: Vec<ApiResource>,
    objects: BTreeMap<GroupVersionKind, Vec<DynamicObject>>,
    /// Remaining failures per kind; `None` fails forever.
    failing: HashMap<GroupVersionKind, Option<usize>>,
    /// Remaining timeouts per kind and continuation token.
    failing_pages: HashMap<(GroupVersionKind, String), usize>,
    discovery_fails: bool,
    requests: Vec<(GroupVersionKind, ListParams)>,
}

/// Cluster API backed by shared in-memory state.
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises `resource` through discovery.
    pub fn serve(&self, resource: ApiResource) {
        self.state.lock().unwrap().resources.push(resource);
    }

    /// Adds or replaces (same namespace and name) an object.
    pub fn put(&self, obj: DynamicObject) {
        let mut state = self.state.lock().unwrap();
        let items = state.objects.entry(obj.gvk()).or_default();
        items.retain(|o| !(o.name() == obj.name() && o.namespace() == obj.namespace()));
        items.push(obj);
    }

    pub fn delete(&self, gvk: &GroupVersionKind, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(items) = state.objects.get_mut(gvk) {
            items.retain(|o| !(o.name() == name && o.namespace() == namespace));
        }
    }

    /// Makes every list of `gvk` fail.
    pub fn fail_kind(&self, gvk: &GroupVersionKind) {
        self.state.lock().unwrap().failing.insert(gvk.clone(), None);
    }

    /// Makes the next `times` lists of `gvk` fail.
    pub fn fail_kind_times(&self, gvk: &GroupVersionKind, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(gvk.clone(), Some(times));
    }

    /// Makes the next `times` requests for the page after `token` time out.
    pub fn fail_page_times(&self, gvk: &GroupVersionKind, token: &str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failing_pages
            .insert((gvk.clone(), token.to_string()), times);
    }

    pub fn heal_kind(&self, gvk: &GroupVersionKind) {
        self.state.lock().unwrap().failing.remove(gvk);
    }

    pub fn fail_discovery(&self, fails: bool) {
        self.state.lock().unwrap().discovery_fails = fails;
    }

    /// List requests made so far for `gvk`.
    pub fn requests_for(&self, gvk: &GroupVersionKind) -> Vec<ListParams> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(g, _)| g == gvk)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn discover_resources(&self) -> Result<Vec<ApiResource>, ClusterError> {
        let state = self.state.lock().unwrap();
        if state.discovery_fails {
            return Err(ClusterError::Discovery(
                "the server is currently unable to handle the request".into(),
            ));
        }
        Ok(state.resources.clone())
    }

    async fn list(
        &self,
        gvk: &GroupVersionKind,
        params: &ListParams,
    ) -> Result<ObjectList, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((gvk.clone(), params.clone()));

        if let Some(remaining) = state.failing.get_mut(gvk) {
            match remaining {
                None => {
                    return Err(ClusterError::List {
                        gvk: gvk.clone(),
                        message: "no matches for kind".into(),
                    })
                }
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return Err(ClusterError::List {
                        gvk: gvk.clone(),
                        message: "connection reset by peer".into(),
                    });
                }
            }
        }

        if let Some(token) = &params.continue_token {
            if let Some(n) = state.failing_pages.get_mut(&(gvk.clone(), token.clone())) {
                if *n > 0 {
                    *n -= 1;
                    return Err(ClusterError::Timeout(format!("listing {gvk} page {token}")));
                }
            }
        }

        let matching: Vec<DynamicObject> = state
            .objects
            .get(gvk)
            .map(|items| {
                items
                    .iter()
                    .filter(|o| match &params.namespace {
                        Some(ns) => o.namespace() == ns,
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let start: usize = params
            .continue_token
            .as_deref()
            .map(|t| t.parse().expect("continue token"))
            .unwrap_or(0);
        let end = if params.limit == 0 {
            matching.len()
        } else {
            (start + params.limit as usize).min(matching.len())
        };

        // Real list responses omit the kind on items.
        let items = matching[start.min(end)..end]
            .iter()
            .cloned()
            .map(|mut o| {
                o.api_version.clear();
                o.kind.clear();
                o
            })
            .collect();

        Ok(ObjectList {
            items,
            continue_token: if end < matching.len() {
                end.to_string()
            } else {
                String::new()
            },
        })
    }
}

#[derive(Default)]
struct Calls {
    single: Vec<Request>,
    batches: Vec<(Vec<String>, String)>,
    retracted: Vec<MetricLabels>,
    failing_names: HashSet<String>,
    outcome: Option<ValidationOutcome>,
}

/// Evaluator that records its calls. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingEvaluator {
    calls: Arc<Mutex<Calls>>,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, outcome: ValidationOutcome) {
        self.calls.lock().unwrap().outcome = Some(outcome);
    }

    /// Fails any call that includes an object with this name.
    pub fn fail_on(&self, name: &str) {
        self.calls
            .lock()
            .unwrap()
            .failing_names
            .insert(name.to_string());
    }

    pub fn single_calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().single.clone()
    }

    /// Object names and namespace uid of every batch call.
    pub fn batch_calls(&self) -> Vec<(Vec<String>, String)> {
        self.calls.lock().unwrap().batches.clone()
    }

    pub fn retracted(&self) -> Vec<MetricLabels> {
        self.calls.lock().unwrap().retracted.clone()
    }

    /// Number of times `name` was submitted, alone or in a batch.
    pub fn times_evaluated(&self, name: &str) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.single.iter().filter(|r| r.name == name).count()
            + calls
                .batches
                .iter()
                .filter(|(names, _)| names.iter().any(|n| n == name))
                .count()
    }
}

impl Evaluator for RecordingEvaluator {
    fn evaluate_one(
        &self,
        request: &Request,
        object: &dyn TypedObject,
    ) -> Result<ValidationOutcome, EvaluationError> {
        let mut calls = self.calls.lock().unwrap();
        assert_eq!(object.metadata().name, request.name);
        calls.single.push(request.clone());
        if calls.failing_names.contains(&request.name) {
            return Err(EvaluationError::Object {
                kind: request.kind.clone(),
                name: request.name.clone(),
                message: "check crashed".into(),
            });
        }
        Ok(calls.outcome.unwrap_or(ValidationOutcome::Valid))
    }

    fn evaluate_batch(
        &self,
        objects: &[Box<dyn TypedObject>],
        namespace_uid: &str,
    ) -> Result<ValidationOutcome, EvaluationError> {
        let mut calls = self.calls.lock().unwrap();
        let names: Vec<String> = objects.iter().map(|o| o.metadata().name.clone()).collect();
        let failing = names.iter().any(|n| calls.failing_names.contains(n));
        calls.batches.push((names, namespace_uid.to_string()));
        if failing {
            return Err(EvaluationError::Batch {
                namespace_uid: namespace_uid.to_string(),
                message: "check crashed".into(),
            });
        }
        Ok(calls.outcome.unwrap_or(ValidationOutcome::NeedsImprovement))
    }

    fn retract_metrics(&self, labels: &MetricLabels) {
        self.calls.lock().unwrap().retracted.push(labels.clone());
    }
}

pub type TestReconciler =
    GenericReconciler<FakeCluster, WatchNamespacesCache<FakeCluster>, RecordingEvaluator>;

/// Config with small pages and millisecond backoff.
pub fn test_config() -> ReconcilerConfig {
    ReconcilerConfig::default()
        .with_page_size(2)
        .with_pass_interval(Duration::from_millis(5))
        .with_backoff(BackoffPolicy {
            steps: 3,
            initial_delay: Duration::from_millis(1),
            factor: 2,
            max_delay: Duration::from_millis(4),
        })
}

pub fn reconciler(cluster: &FakeCluster, evaluator: &RecordingEvaluator) -> TestReconciler {
    reconciler_with_config(cluster, evaluator, test_config())
}

pub fn reconciler_with_config(
    cluster: &FakeCluster,
    evaluator: &RecordingEvaluator,
    config: ReconcilerConfig,
) -> TestReconciler {
    let client = Arc::new(cluster.clone());
    let namespaces = WatchNamespacesCache::new(
        Arc::clone(&client),
        config.page_size,
        config.namespace_ignore_pattern.clone(),
    );
    let mut scheme = TypeScheme::new();
    register_builtin(&mut scheme);
    GenericReconciler::new(client, namespaces, evaluator.clone(), config).with_scheme(scheme)
}

/// Cluster serving Deployments, Services, disruption budgets and ClusterRoles,
/// with the namespaces `shop` and `billing`.
pub fn standard_cluster() -> FakeCluster {
    let cluster = FakeCluster::new();
    cluster.serve(builders::api_resource(&builders::deployment_gvk(), "deployments", true));
    cluster.serve(builders::api_resource(&builders::service_gvk(), "services", true));
    cluster.serve(builders::api_resource(&builders::pdb_gvk(), "poddisruptionbudgets", true));
    cluster.serve(builders::api_resource(
        &builders::cluster_role_gvk(),
        "clusterroles",
        false,
    ));
    cluster.put(builders::namespace("shop"));
    cluster.put(builders::namespace("billing"));
    cluster
}
