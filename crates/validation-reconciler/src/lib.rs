pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod namespaces;
pub mod reconciler;
pub mod shutdown;
pub mod telemetry;
pub mod validation;

pub use cache::{CacheEntry, Freshness, ObjectKey, VersionedCache};
pub use cluster::{
    ApiResource, ClusterApi, ClusterError, ConversionError, DynamicObject, GroupVersionKind,
    ListParams, ObjectList, ObjectMeta, OwnerReference, TypeScheme, TypedObject,
};
pub use config::ReconcilerConfig;
pub use error::{AggregateError, ConfigError, ReconcileError, Result};
pub use namespaces::{NamespaceScope, WatchNamespacesCache, WatchedNamespace};
pub use reconciler::{GenericReconciler, PassReport, PassScheduler};
pub use shutdown::Shutdown;
pub use telemetry::{init_logging, LogFormat};
pub use validation::{EvaluationError, Evaluator, MetricLabels, Request, ValidationOutcome};
