//! Generic reconciler: discover → list → validate → reclaim.
//!
//! One pass enumerates every listable kind, validates each object at most once
//! per revision, and retracts the state of objects that were not seen again.
//! Cluster scoped kinds are validated object by object. Namespaced objects are
//! grouped by their `app` label and each group is validated in one batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::Instrument;

use crate::cache::{Freshness, ObjectKey, VersionedCache};
use crate::cluster::{ClusterApi, DynamicObject, GroupVersionKind, TypeScheme};
use crate::config::ReconcilerConfig;
use crate::error::{AggregateError, ReconcileError, Result};
use crate::namespaces::NamespaceScope;
use crate::reconciler::pagination::Paginator;
use crate::reconciler::report::{PassPhase, PassReport};
use crate::reconciler::resources::{enumerate_resources, ResourceSet};
use crate::shutdown::Shutdown;
use crate::validation::{Evaluator, Request};

/// Reconciles every object of every kind the cluster serves.
///
/// Owns both caches: `validated` survives across passes, `observed` is the live
/// set rebuilt by each pass. Neither is synchronised; a reconciler runs one pass
/// at a time.
pub struct GenericReconciler<C, N, E> {
    client: Arc<C>,
    scheme: TypeScheme,
    namespaces: N,
    evaluator: E,
    config: ReconcilerConfig,
    validated: VersionedCache,
    observed: VersionedCache,
    passes: u64,
    last_report: Option<PassReport>,
}

impl<C, N, E> GenericReconciler<C, N, E>
where
    C: ClusterApi,
    N: NamespaceScope,
    E: Evaluator,
{
    /// Creates a reconciler with the built-in type scheme and an empty cache.
    pub fn new(client: Arc<C>, namespaces: N, evaluator: E, config: ReconcilerConfig) -> Self {
        Self {
            client,
            scheme: TypeScheme::with_builtin_types(),
            namespaces,
            evaluator,
            config,
            validated: VersionedCache::new(),
            observed: VersionedCache::new(),
            passes: 0,
            last_report: None,
        }
    }

    /// Replaces the type scheme used for discovery filtering and conversion.
    pub fn with_scheme(mut self, scheme: TypeScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Starts from a previously populated validation cache.
    pub fn with_cache(mut self, cache: VersionedCache) -> Self {
        self.validated = cache;
        self
    }

    /// Validation cache: what was validated, at which revision.
    pub fn cache(&self) -> &VersionedCache {
        &self.validated
    }

    /// Objects observed by the pass in progress. Empty between passes.
    pub fn live_set(&self) -> &VersionedCache {
        &self.observed
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn namespaces(&self) -> &N {
        &self.namespaces
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Report of the most recent pass, including failed ones.
    pub fn last_report(&self) -> Option<&PassReport> {
        self.last_report.as_ref()
    }

    /// Runs one full pass.
    ///
    /// Failures listing one cluster scoped kind do not stop the others; all of
    /// them are returned together once the pass completes.
    pub async fn reconcile_everything(&mut self, shutdown: &Shutdown) -> Result<PassReport> {
        self.passes += 1;
        let mut report = PassReport::start(self.passes);
        let span = tracing::info_span!("reconcile_pass", pass = self.passes);

        let result = self.run_pass(shutdown, &mut report).instrument(span).await;

        report.finish(result.as_ref().err().map(ToString::to_string));
        log::info!(
            "Pass {} finished: {} observed, {} cache hits, {} evaluations ({} objects), {} \
             deletions",
            report.pass,
            report.objects_observed,
            report.cache_hits,
            report.evaluations,
            report.objects_evaluated,
            report.deletions
        );
        self.last_report = Some(report.clone());

        result.map(|()| report)
    }

    async fn run_pass(&mut self, shutdown: &Shutdown, report: &mut PassReport) -> Result<()> {
        report.enter(PassPhase::Enumerating);
        let resources = shutdown
            .guard(enumerate_resources(self.client.as_ref(), &self.scheme))
            .await?
            .map_err(ReconcileError::Discovery)?;

        for (i, gvk) in resources.iter().enumerate() {
            log::debug!("apiResource {}: {}", i + 1, gvk);
        }
        report.cluster_scoped_kinds = resources.cluster_scoped.len();
        report.namespaced_kinds = resources.namespaced.len();

        self.namespaces.reset_cache();

        let processed = self.process_all_resources(&resources, shutdown, report).await;
        report.objects_observed = self.observed.len();

        report.enter(PassPhase::ReclaimingDeleted);
        match processed {
            Ok(()) => {
                self.handle_resource_deletions(report);
                Ok(())
            }
            Err(e) => {
                log::warn!("Pass incomplete, skipping deletion reclaim");
                report.deletions_skipped = true;
                self.observed.drain();
                Err(e)
            }
        }
    }

    async fn process_all_resources(
        &mut self,
        resources: &ResourceSet,
        shutdown: &Shutdown,
        report: &mut PassReport,
    ) -> Result<()> {
        let mut errors = AggregateError::new();

        report.enter(PassPhase::ProcessingClusterScoped);
        for gvk in &resources.cluster_scoped {
            if let Err(e) = self.process_cluster_scoped(gvk, shutdown, report).await {
                if e.is_cancelled() {
                    return Err(e);
                }
                log::warn!("Processing {} failed: {}", gvk, e);
                errors.push(ReconcileError::ClusterScoped {
                    gvk: gvk.clone(),
                    source: Box::new(e),
                });
            }
        }

        report.enter(PassPhase::ProcessingNamespaced);
        if let Err(e) = self
            .process_namespaced_resources(&resources.namespaced, shutdown, report)
            .await
        {
            errors.push(ReconcileError::Namespaced(Box::new(e)));
        }

        errors.into_result()
    }

    async fn process_cluster_scoped(
        &mut self,
        gvk: &GroupVersionKind,
        shutdown: &Shutdown,
        report: &mut PassReport,
    ) -> Result<()> {
        let client = Arc::clone(&self.client);
        let paginator = Paginator::new(
            client.as_ref(),
            self.config.page_size,
            self.config.backoff,
            shutdown,
        );

        paginator
            .for_each_with_retry(gvk, None, |obj| {
                self.reconcile(&obj, report)
                    .map_err(|e| ReconcileError::Object {
                        object: ObjectKey::from_object(&obj).to_string(),
                        source: Box::new(e),
                    })
            })
            .await
    }

    /// Validates namespaced objects group by group.
    ///
    /// Unlike cluster scoped kinds, the first failing namespace ends namespaced
    /// processing for the rest of the pass.
    async fn process_namespaced_resources(
        &mut self,
        gvks: &[GroupVersionKind],
        shutdown: &Shutdown,
        report: &mut PassReport,
    ) -> Result<()> {
        let namespaces = shutdown
            .guard(self.namespaces.watch_namespaces())
            .await?
            .map_err(ReconcileError::WatchNamespaces)?;
        report.namespaces = namespaces.len();

        for namespace in &namespaces {
            let groups = self
                .group_app_objects(&namespace.name, gvks, shutdown)
                .await?;

            for (label, objects) in groups {
                log::info!(
                    "Reconciling group of {} objects with app label '{}' in namespace '{}'",
                    objects.len(),
                    label,
                    namespace.name
                );
                self.reconcile_group_of_objects(&objects, &namespace.name, report)
                    .map_err(|e| ReconcileError::AppGroup {
                        namespace: namespace.name.clone(),
                        label,
                        source: Box::new(e),
                    })?;
            }
        }

        Ok(())
    }

    /// Lists every namespaced kind in `namespace` and groups the objects by app label.
    ///
    /// Objects without an app label are left out entirely.
    async fn group_app_objects(
        &self,
        namespace: &str,
        gvks: &[GroupVersionKind],
        shutdown: &Shutdown,
    ) -> Result<BTreeMap<String, Vec<DynamicObject>>> {
        let paginator = Paginator::new(
            self.client.as_ref(),
            self.config.page_size,
            self.config.backoff,
            shutdown,
        );
        let mut groups: BTreeMap<String, Vec<DynamicObject>> = BTreeMap::new();

        for gvk in gvks {
            for obj in paginator.collect_with_retry(gvk, Some(namespace)).await? {
                let Some(label) = obj.app_label().map(str::to_string) else {
                    continue;
                };
                groups.entry(label).or_default().push(obj);
            }
        }

        Ok(groups)
    }

    fn reconcile_group_of_objects(
        &mut self,
        objects: &[DynamicObject],
        namespace: &str,
        report: &mut PassReport,
    ) -> Result<()> {
        let mut pending = Vec::with_capacity(objects.len());
        for obj in objects {
            self.observed.store_object(obj, None);
            if self.is_already_validated(obj) {
                report.cache_hits += 1;
                continue;
            }
            pending.push(obj);
        }

        if pending.is_empty() {
            return Ok(());
        }

        let namespace_uid = self.namespaces.namespace_uid(namespace);
        let typed = pending
            .iter()
            .map(|obj| self.scheme.convert(obj))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let outcome = self.evaluator.evaluate_batch(&typed, &namespace_uid)?;
        report.evaluations += 1;

        for obj in pending {
            self.validated.store_object(obj, Some(outcome));
            report.objects_evaluated += 1;
        }

        Ok(())
    }

    /// Validates a single object unless its current revision already was.
    fn reconcile(&mut self, obj: &DynamicObject, report: &mut PassReport) -> Result<()> {
        let key = ObjectKey::from_object(obj);
        // Seen earlier in this pass, before a retried listing restarted.
        if self.observed.check(&key, obj.resource_version()) == Freshness::Fresh {
            return Ok(());
        }

        self.observed.store_object(obj, None);
        if self.is_already_validated(obj) {
            report.cache_hits += 1;
            return Ok(());
        }

        let mut request = Request::from_object(obj);
        if !request.namespace.is_empty() {
            let namespace_uid = self.namespaces.namespace_uid(&request.namespace);
            if namespace_uid.is_empty() {
                log::debug!("Namespace UID not found for '{}'", request.namespace);
            }
            request.namespace_uid = namespace_uid;
        }

        log::trace!("Reconcile {}", key);

        let typed = self.scheme.convert(obj)?;
        let outcome = self.evaluator.evaluate_one(&request, typed.as_ref())?;
        report.evaluations += 1;
        report.objects_evaluated += 1;

        self.validated.store_object(obj, Some(outcome));
        Ok(())
    }

    /// Checks the cache for `obj`'s current revision, evicting an outdated entry.
    fn is_already_validated(&mut self, obj: &DynamicObject) -> bool {
        let key = ObjectKey::from_object(obj);
        self.validated.already_evaluated(&key, obj.resource_version())
    }

    /// Retracts and forgets every validated object the pass did not observe.
    fn handle_resource_deletions(&mut self, report: &mut PassReport) {
        for key in self.validated.stale_against(&self.observed) {
            let Some(entry) = self.validated.retrieve(&key) else {
                continue;
            };
            let request = Request::for_deleted(
                &key,
                &entry.uid,
                self.namespaces.namespace_uid(&key.namespace),
            );
            log::info!("{} no longer exists, retracting its metrics", key);
            self.evaluator.retract_metrics(&request.to_metric_labels());
            self.validated.remove(&key);
            report.deletions += 1;
        }
        self.observed.drain();
    }
}
