//! Reconciliation engine and the loop that drives it.

pub mod backoff;
pub mod engine;
pub mod pagination;
pub mod report;
pub mod resources;
pub mod scheduler;

pub use backoff::BackoffPolicy;
pub use engine::GenericReconciler;
pub use pagination::Paginator;
pub use report::{PassPhase, PassReport};
pub use resources::{enumerate_resources, ResourceSet};
pub use scheduler::PassScheduler;
