//! NativeObjectConverter - flattens Model/Collection graphs into plain data.
//!
//! Conversion walks the live graph in attribute-declaration order and keeps a
//! cache keyed by `ClientId`. Every DataComponent is converted exactly once;
//! later references (including cycles back to the root) reuse the same output
//! container.
//!
//! ## Example
//!
//! ```ignore
//! use databind::{ConvertOptions, NativeObjectConverter};
//!
//! let native = NativeObjectConverter::convert(
//!     &order.into(),
//!     &ConvertOptions::new().raw(true).persisted_only(true),
//! )?;
//! let payload = native.to_json()?;
//! ```

mod native;

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::model::{
    Attribute, AttributeKind, AttributeValue, ClientId, Collection, DataComponent, Model,
    ModelError,
};

pub use native::{NativeArray, NativeObject, NativeValue};

/// Options for a single conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertOptions {
    /// Restricts the attributes of the top-level Model only.
    pub attribute_names: Option<Vec<String>>,
    /// Skip attributes that are not persisted.
    pub persisted_only: bool,
    /// Read attributes through `Model::raw` instead of `Model::get`, and send
    /// only identifiers for related Collections.
    pub raw: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn persisted_only(mut self, persisted_only: bool) -> Self {
        self.persisted_only = persisted_only;
        self
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}

/// Error type for graph conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Reading the source graph failed.
    Model(ModelError),
    /// A cyclic output graph cannot be rendered as JSON.
    CircularReference,
    /// An identifier attribute held a Model or Collection.
    NonScalarId { model: String },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Model(err) => write!(f, "conversion failed: {}", err),
            ConvertError::CircularReference => {
                write!(f, "circular reference cannot be rendered as JSON")
            }
            ConvertError::NonScalarId { model } => {
                write!(f, "identifier of {} is not a scalar value", model)
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for ConvertError {
    fn from(err: ModelError) -> Self {
        ConvertError::Model(err)
    }
}

/// Converts DataComponent graphs into `NativeValue` graphs.
pub struct NativeObjectConverter;

impl NativeObjectConverter {
    /// Convert a Model (into an object) or a Collection (into an array).
    pub fn convert(
        component: &DataComponent,
        options: &ConvertOptions,
    ) -> Result<NativeValue, ConvertError> {
        let mut conversion = Conversion {
            options,
            cache: HashMap::new(),
        };

        match component {
            DataComponent::Model(model) => {
                let output = NativeObject::new();
                // Registered before recursing so a cycle back to the root resolves.
                conversion
                    .cache
                    .insert(model.client_id(), NativeValue::Object(output.clone()));
                conversion.fill_model(model, &output, options.attribute_names.as_deref())?;
                Ok(NativeValue::Object(output))
            }
            DataComponent::Collection(collection) => {
                let output = NativeArray::new();
                conversion
                    .cache
                    .insert(collection.client_id(), NativeValue::Array(output.clone()));
                conversion.fill_collection(collection, &output)?;
                Ok(NativeValue::Array(output))
            }
        }
    }

    /// Convert and render as JSON in one step.
    pub fn convert_to_json(
        component: &DataComponent,
        options: &ConvertOptions,
    ) -> Result<Value, ConvertError> {
        Self::convert(component, options)?.to_json()
    }
}

struct Conversion<'a> {
    options: &'a ConvertOptions,
    cache: HashMap<ClientId, NativeValue>,
}

impl Conversion<'_> {
    fn fill_model(
        &mut self,
        model: &Model,
        output: &NativeObject,
        attribute_names: Option<&[String]>,
    ) -> Result<(), ConvertError> {
        for attribute in model.attributes() {
            let name = attribute.name();
            if let Some(names) = attribute_names {
                if !names.iter().any(|n| n == name) {
                    continue;
                }
            }
            if self.options.persisted_only && !attribute.is_persisted() {
                continue;
            }

            let value = if self.options.raw {
                model.raw(name)?
            } else {
                model.get(name)?
            };
            let native = self.convert_value(attribute, value)?;
            output.insert(name, native);
        }
        Ok(())
    }

    fn fill_collection(
        &mut self,
        collection: &Collection,
        output: &NativeArray,
    ) -> Result<(), ConvertError> {
        for model in collection.get_models()? {
            let native = self.convert_model(&model)?;
            output.push(native);
        }
        Ok(())
    }

    fn convert_value(
        &mut self,
        attribute: &Attribute,
        value: AttributeValue,
    ) -> Result<NativeValue, ConvertError> {
        match value {
            AttributeValue::Null => Ok(NativeValue::Scalar(Value::Null)),
            AttributeValue::Scalar(value) => Ok(NativeValue::Scalar(value)),
            AttributeValue::Model(model) => {
                let id_only = matches!(
                    attribute.kind(),
                    AttributeKind::Model(m) if m.is_embedded() && m.persists_id_only()
                );
                if self.options.raw && id_only {
                    id_only_object(&model)
                } else {
                    self.convert_model(&model)
                }
            }
            AttributeValue::Collection(collection) => {
                // Related collections go over the wire as foreign keys.
                if self.options.raw && !attribute.is_embedded() {
                    let output = NativeArray::new();
                    for model in collection.get_models()? {
                        output.push(id_only_object(&model)?);
                    }
                    Ok(NativeValue::Array(output))
                } else {
                    self.convert_collection(&collection)
                }
            }
        }
    }

    fn convert_model(&mut self, model: &Model) -> Result<NativeValue, ConvertError> {
        if let Some(existing) = self.cache.get(&model.client_id()) {
            trace!(client_id = %model.client_id(), "reusing converted model");
            return Ok(existing.clone());
        }

        let output = NativeObject::new();
        self.cache
            .insert(model.client_id(), NativeValue::Object(output.clone()));
        self.fill_model(model, &output, None)?;
        Ok(NativeValue::Object(output))
    }

    fn convert_collection(&mut self, collection: &Collection) -> Result<NativeValue, ConvertError> {
        if let Some(existing) = self.cache.get(&collection.client_id()) {
            trace!(client_id = %collection.client_id(), "reusing converted collection");
            return Ok(existing.clone());
        }

        let output = NativeArray::new();
        self.cache
            .insert(collection.client_id(), NativeValue::Array(output.clone()));
        self.fill_collection(collection, &output)?;
        Ok(NativeValue::Array(output))
    }
}

/// `{ <idAttributeName>: <id> }` for one Model.
fn id_only_object(model: &Model) -> Result<NativeValue, ConvertError> {
    let id = match model.get_id()? {
        AttributeValue::Null => Value::Null,
        AttributeValue::Scalar(value) => value,
        _ => {
            return Err(ConvertError::NonScalarId {
                model: model.class().name().to_string(),
            })
        }
    };
    let output = NativeObject::new();
    output.insert(model.id_attribute_name(), NativeValue::Scalar(id));
    Ok(NativeValue::Object(output))
}
