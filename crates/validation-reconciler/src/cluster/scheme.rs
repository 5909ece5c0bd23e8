//! Registry of statically-shaped object types keyed by group/version/kind.
//!
//! Listing returns untyped [`DynamicObject`]s. Before an object is handed to the
//! evaluation engine it is converted into the concrete shape registered for its kind:
//! [`TypeScheme::resolve`] finds the shape, [`TypeEntry::convert`] performs the
//! structural conversion.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::shapes;
use super::types::{DynamicObject, GroupVersionKind, ObjectMeta};

/// Errors raised while turning an untyped object into a typed one.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("No type registered for {0}")]
    Unregistered(GroupVersionKind),

    #[error("Converting {gvk} '{name}' into {type_name}: {source}")]
    Structural {
        gvk: GroupVersionKind,
        name: String,
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A concrete object shape the evaluation engine can inspect.
pub trait TypedObject: Debug + Send + Sync + 'static {
    fn gvk(&self) -> GroupVersionKind;

    fn metadata(&self) -> &ObjectMeta;

    fn as_any(&self) -> &dyn Any;
}

type Constructor = fn(serde_json::Value) -> serde_json::Result<Box<dyn TypedObject>>;

fn construct<T>(value: serde_json::Value) -> serde_json::Result<Box<dyn TypedObject>>
where
    T: TypedObject + DeserializeOwned,
{
    let typed: T = serde_json::from_value(value)?;
    Ok(Box::new(typed))
}

/// Shape descriptor for one registered kind.
#[derive(Clone)]
pub struct TypeEntry {
    gvk: GroupVersionKind,
    type_name: &'static str,
    construct: Constructor,
}

impl TypeEntry {
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    /// Rust type name of the registered shape.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Structurally converts an untyped object into this shape.
    pub fn convert(&self, obj: &DynamicObject) -> Result<Box<dyn TypedObject>, ConversionError> {
        let structural = |source: serde_json::Error| ConversionError::Structural {
            gvk: self.gvk.clone(),
            name: obj.name().to_string(),
            type_name: self.type_name,
            source,
        };
        let value = serde_json::to_value(obj).map_err(structural)?;
        (self.construct)(value).map_err(structural)
    }
}

impl Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("gvk", &self.gvk)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Maps kinds to constructors for their typed shapes.
#[derive(Debug, Clone, Default)]
pub struct TypeScheme {
    types: HashMap<GroupVersionKind, TypeEntry>,
}

impl TypeScheme {
    /// Creates an empty scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheme with the workload, policy and RBAC shapes in [`shapes`].
    pub fn with_builtin_types() -> Self {
        let mut scheme = Self::new();
        shapes::register_builtin(&mut scheme);
        scheme
    }

    /// Registers `T` as the shape for `gvk`, replacing any earlier registration.
    pub fn register<T>(&mut self, gvk: GroupVersionKind)
    where
        T: TypedObject + DeserializeOwned,
    {
        let entry = TypeEntry {
            gvk: gvk.clone(),
            type_name: std::any::type_name::<T>(),
            construct: construct::<T>,
        };
        self.types.insert(gvk, entry);
    }

    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.types.contains_key(gvk)
    }

    /// Looks up the shape registered for `gvk`.
    pub fn resolve(&self, gvk: &GroupVersionKind) -> Option<&TypeEntry> {
        self.types.get(gvk)
    }

    /// Resolves the object's reported kind and converts it.
    pub fn convert(&self, obj: &DynamicObject) -> Result<Box<dyn TypedObject>, ConversionError> {
        let gvk = obj.gvk();
        let entry = self
            .resolve(&gvk)
            .ok_or(ConversionError::Unregistered(gvk))?;
        entry.convert(obj)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
