//! Cluster-facing types: the object model, the API contract consumed from the
//! server, and the registry used to turn untyped list items into typed shapes.

pub mod api;
pub mod scheme;
pub mod shapes;
pub mod types;

pub use api::{ClusterApi, ClusterError};
pub use scheme::{ConversionError, TypeEntry, TypeScheme, TypedObject};
pub use types::{
    ApiResource, DynamicObject, GroupVersionKind, ListParams, ObjectList, ObjectMeta,
    OwnerReference, APP_LABEL,
};
