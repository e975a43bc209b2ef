//! Models - dynamically-typed entities described by a `ModelClass`.
//!
//! A `Model` is a shared handle: cloning it yields another reference to the
//! same live instance, and identity is tracked through its `ClientId`.
//! Attribute slots can hold plain JSON, nested Models, or Collections, so a
//! graph of models may contain shared and cyclic references.
//!
//! ## Example
//!
//! ```ignore
//! use databind::{Attribute, Model, ModelClass};
//!
//! let customer = ModelClass::builder("app.Customer")
//!     .attribute(Attribute::new("name"))
//!     .build();
//!
//! let model = Model::new(customer)?;
//! model.set("name", "Ada")?;
//! assert!(model.is_modified()?);
//! ```

mod attribute;
mod class;
mod class_ref;
mod collection;
mod data_component;
mod model;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use attribute::{
    Attribute, AttributeKind, AttributeValue, CollectionAttribute, ModelAttribute, ValueTransform,
};
pub use class::{ModelClass, ModelClassBuilder, ModelRegistry};
pub use class_ref::ModelClassRef;
pub use collection::Collection;
pub use data_component::DataComponent;
pub use model::Model;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-local identity of a Model or Collection instance.
///
/// Distinct from any persisted primary key: two instances loaded from the same
/// record still get different client ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn next() -> Self {
        ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Error type for model definition and attribute assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The model class has no attribute with this name.
    UnknownAttribute { model: String, attribute: String },
    /// A model class reference or attribute descriptor is misconfigured.
    Config(String),
    /// A value that is neither null nor of the expected kind reached an attribute slot.
    DataIntegrity {
        model: String,
        attribute: String,
        reason: String,
    },
    /// A class with this name is already registered.
    DuplicateClass(String),
    /// An internal lock was poisoned.
    LockPoisoned(&'static str),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownAttribute { model, attribute } => {
                write!(f, "model {} has no attribute '{}'", model, attribute)
            }
            ModelError::Config(msg) => write!(f, "model configuration error: {}", msg),
            ModelError::DataIntegrity {
                model,
                attribute,
                reason,
            } => write!(
                f,
                "invalid value for {}.{}: {}",
                model, attribute, reason
            ),
            ModelError::DuplicateClass(name) => {
                write!(f, "model class already registered: {}", name)
            }
            ModelError::LockPoisoned(operation) => {
                write!(f, "model lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for ModelError {}
