use thiserror::Error;

use crate::cluster::{ClusterError, ConversionError, GroupVersionKind};
use crate::validation::EvaluationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{name}' must be a non-negative integer, got '{value}': {source}")]
    InvalidInteger {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    NotUnicode { name: &'static str },

    #[error("Invalid namespace ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Logging already initialised: {0}")]
    Logging(String),
}

/// Errors surfaced by a reconciliation pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Retrieving resources to reconcile: {0}")]
    Discovery(#[source] ClusterError),

    #[error("Listing {gvk}: {source}")]
    List {
        gvk: GroupVersionKind,
        #[source]
        source: ClusterError,
    },

    #[error("Getting watched namespaces: {0}")]
    WatchNamespaces(#[source] ClusterError),

    #[error("Instantiating typed object: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Running validations: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Reconciling object '{object}': {source}")]
    Object {
        object: String,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("Processing cluster scoped resources of type {gvk}: {source}")]
    ClusterScoped {
        gvk: GroupVersionKind,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("Reconciling related objects with 'app' label value '{label}' in namespace '{namespace}': {source}")]
    AppGroup {
        namespace: String,
        label: String,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("Processing namespace scoped resources: {0}")]
    Namespaced(#[source] Box<ReconcileError>),

    #[error("{0}")]
    Aggregate(AggregateError),

    #[error("Reconciliation cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Returns true if the error is likely transient and the listing can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::List { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the error, or any error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ReconcileError::Cancelled => true,
            ReconcileError::Object { source, .. }
            | ReconcileError::ClusterScoped { source, .. }
            | ReconcileError::AppGroup { source, .. }
            | ReconcileError::Namespaced(source) => source.is_cancelled(),
            ReconcileError::Aggregate(aggregate) => {
                aggregate.errors().iter().any(ReconcileError::is_cancelled)
            }
            _ => false,
        }
    }
}

/// Several independent failures collected over one pass.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<ReconcileError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ReconcileError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ReconcileError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing was collected, the lone error when there is one,
    /// an aggregate otherwise.
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ReconcileError::Aggregate(self)),
        }
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} errors occurred: ", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
