//! Attribute descriptors and the values they hold.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Collection, Model, ModelClass, ModelClassRef, ModelError, ModelRegistry};

/// A transform applied when reading an attribute (`Model::get` / `Model::raw`).
pub type ValueTransform = Arc<dyn Fn(&AttributeValue) -> AttributeValue + Send + Sync>;

/// The value held in one attribute slot of a Model.
#[derive(Debug, Clone, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Scalar(Value),
    Model(Model),
    Collection(Collection),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            AttributeValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            AttributeValue::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            AttributeValue::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Change-detection equality: JSON equality for plain values, reference
    /// equality for Models and Collections.
    pub fn same_as(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::Null, AttributeValue::Null) => true,
            (AttributeValue::Scalar(a), AttributeValue::Scalar(b)) => a == b,
            (AttributeValue::Model(a), AttributeValue::Model(b)) => a.ptr_eq(b),
            (AttributeValue::Collection(a), AttributeValue::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            other => AttributeValue::Scalar(other),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Scalar(Value::String(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Scalar(Value::from(value))
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Scalar(Value::from(value))
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Scalar(Value::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Scalar(Value::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Scalar(Value::Bool(value))
    }
}

impl From<Model> for AttributeValue {
    fn from(model: Model) -> Self {
        AttributeValue::Model(model)
    }
}

impl From<&Model> for AttributeValue {
    fn from(model: &Model) -> Self {
        AttributeValue::Model(model.clone())
    }
}

impl From<Collection> for AttributeValue {
    fn from(collection: Collection) -> Self {
        AttributeValue::Collection(collection)
    }
}

impl From<Option<Model>> for AttributeValue {
    fn from(model: Option<Model>) -> Self {
        model.map(AttributeValue::Model).unwrap_or_default()
    }
}

/// What an attribute slot may hold.
#[derive(Debug, Clone, Default)]
pub enum AttributeKind {
    /// Any value; no coercion.
    #[default]
    Plain,
    /// A nested Model of a (possibly late-bound) class.
    Model(ModelAttribute),
    /// A Collection of Models.
    Collection(CollectionAttribute),
}

/// Describes one named slot on a `ModelClass`.
pub struct Attribute {
    name: String,
    persist: bool,
    default: Option<Value>,
    getter: Option<ValueTransform>,
    raw: Option<ValueTransform>,
    kind: AttributeKind,
}

impl Attribute {
    /// A plain attribute.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Plain)
    }

    /// An attribute holding a nested Model.
    pub fn model(name: impl Into<String>, model: ModelAttribute) -> Self {
        Self::with_kind(name, AttributeKind::Model(model))
    }

    /// An attribute holding a Collection.
    pub fn collection(name: impl Into<String>, collection: CollectionAttribute) -> Self {
        Self::with_kind(name, AttributeKind::Collection(collection))
    }

    pub fn with_kind(name: impl Into<String>, kind: AttributeKind) -> Self {
        Attribute {
            name: name.into(),
            persist: true,
            default: None,
            getter: None,
            raw: None,
            kind,
        }
    }

    /// Whether the attribute is written by persistence proxies (default true).
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Transform applied by `Model::get`.
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&AttributeValue) -> AttributeValue + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Transform applied by `Model::raw`, e.g. to produce a wire format.
    pub fn raw_with<F>(mut self, raw: F) -> Self
    where
        F: Fn(&AttributeValue) -> AttributeValue + Send + Sync + 'static,
    {
        self.raw = Some(Arc::new(raw));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_persisted(&self) -> bool {
        self.persist
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// True for embedded Model and Collection attributes. Plain attributes are
    /// never embedded.
    pub fn is_embedded(&self) -> bool {
        match &self.kind {
            AttributeKind::Plain => false,
            AttributeKind::Model(model) => model.is_embedded(),
            AttributeKind::Collection(collection) => collection.is_embedded(),
        }
    }

    /// Equality used for change detection on this slot.
    pub fn values_are_equal(&self, old: &AttributeValue, new: &AttributeValue) -> bool {
        old.same_as(new)
    }

    pub(crate) fn apply_getter(&self, value: AttributeValue) -> AttributeValue {
        match &self.getter {
            Some(getter) => getter(&value),
            None => value,
        }
    }

    pub(crate) fn apply_raw(&self, value: AttributeValue) -> AttributeValue {
        match &self.raw {
            Some(raw) => raw(&value),
            None => value,
        }
    }

    /// Run an incoming value through the slot's coercion pipeline.
    pub(crate) fn convert(
        &self,
        owner: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, ModelError> {
        match &self.kind {
            AttributeKind::Plain => Ok(value),
            AttributeKind::Model(model) => model.coerce(owner, &self.name, value),
            AttributeKind::Collection(collection) => collection.coerce(owner, &self.name, value),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("persist", &self.persist)
            .field("default", &self.default)
            .field("has_getter", &self.getter.is_some())
            .field("has_raw", &self.raw.is_some())
            .field("kind", &self.kind)
            .finish()
    }
}

fn integrity_error(owner: &str, attribute: &str, reason: String) -> ModelError {
    ModelError::DataIntegrity {
        model: owner.to_string(),
        attribute: attribute.to_string(),
        reason,
    }
}

/// Slot holding a nested Model.
///
/// `embedded` models are part of the parent: their modifications count as the
/// parent's, and their data is inlined when persisted. Non-embedded models are
/// related entities. `persist_id_only` restricts an embedded model's persisted
/// form to its identifier.
#[derive(Debug, Clone, Default)]
pub struct ModelAttribute {
    model: Option<ModelClassRef>,
    embedded: bool,
    persist_id_only: bool,
}

impl ModelAttribute {
    pub fn new(model: impl Into<Option<ModelClassRef>>) -> Self {
        ModelAttribute {
            model: model.into(),
            embedded: false,
            persist_id_only: false,
        }
    }

    /// Build from a JSON descriptor: `{"model": "app.Customer", "embedded": true,
    /// "persistIdOnly": false}`.
    ///
    /// A `model` key that is present but null fails immediately; this usually
    /// means the referenced class was not defined yet. An absent key is allowed.
    pub fn from_config(
        registry: &ModelRegistry,
        config: &Map<String, Value>,
    ) -> Result<Self, ModelError> {
        let model = match config.get("model") {
            None => None,
            Some(Value::String(path)) => Some(ModelClassRef::by_path(registry, path.as_str())),
            Some(Value::Null) => {
                return Err(ModelError::Config(
                    "'model' is present but undefined; was the class registered yet?".into(),
                ))
            }
            Some(other) => {
                return Err(ModelError::Config(format!(
                    "'model' must be a dotted class path, got {}",
                    other
                )))
            }
        };

        Ok(ModelAttribute {
            model,
            embedded: flag(config, "embedded")?,
            persist_id_only: flag(config, "persistIdOnly")?,
        })
    }

    pub fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn persist_id_only(mut self, persist_id_only: bool) -> Self {
        self.persist_id_only = persist_id_only;
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn persists_id_only(&self) -> bool {
        self.persist_id_only
    }

    pub fn model_ref(&self) -> Option<&ModelClassRef> {
        self.model.as_ref()
    }

    /// Resolve (and memoize) the configured model class.
    pub fn resolve_model_class(&self) -> Result<Arc<ModelClass>, ModelError> {
        self.model
            .as_ref()
            .ok_or_else(|| ModelError::Config("model attribute has no model class configured".into()))?
            .resolve()
    }

    fn coerce(
        &self,
        owner: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, ModelError> {
        match value {
            AttributeValue::Null => Ok(AttributeValue::Null),
            AttributeValue::Model(model) => {
                let class = self.resolve_model_class()?;
                if Arc::ptr_eq(model.class(), &class) {
                    Ok(AttributeValue::Model(model))
                } else {
                    Err(integrity_error(
                        owner,
                        attribute,
                        format!(
                            "expected a {} model, got {}",
                            class.name(),
                            model.class().name()
                        ),
                    ))
                }
            }
            // Anonymous data becomes an instance of the resolved class.
            AttributeValue::Scalar(Value::Object(data)) => {
                let class = self.resolve_model_class()?;
                Ok(AttributeValue::Model(Model::from_data(class, &data)?))
            }
            AttributeValue::Scalar(other) => Err(integrity_error(
                owner,
                attribute,
                format!("expected a model or null, got {}", other),
            )),
            AttributeValue::Collection(_) => Err(integrity_error(
                owner,
                attribute,
                "expected a model or null, got a collection".into(),
            )),
        }
    }
}

/// Slot holding a Collection of Models.
#[derive(Debug, Clone, Default)]
pub struct CollectionAttribute {
    model: Option<ModelClassRef>,
    embedded: bool,
}

impl CollectionAttribute {
    /// `model` is the class used to coerce plain arrays of objects.
    pub fn new(model: impl Into<Option<ModelClassRef>>) -> Self {
        CollectionAttribute {
            model: model.into(),
            embedded: false,
        }
    }

    pub fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn model_ref(&self) -> Option<&ModelClassRef> {
        self.model.as_ref()
    }

    fn coerce(
        &self,
        owner: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, ModelError> {
        match value {
            AttributeValue::Null => Ok(AttributeValue::Null),
            AttributeValue::Collection(collection) => Ok(AttributeValue::Collection(collection)),
            AttributeValue::Scalar(Value::Array(items)) => {
                let class = self
                    .model
                    .as_ref()
                    .ok_or_else(|| {
                        ModelError::Config(format!(
                            "{}.{} cannot coerce an array without a model class",
                            owner, attribute
                        ))
                    })?
                    .resolve()?;
                Ok(AttributeValue::Collection(Collection::from_values(
                    class, &items,
                )?))
            }
            AttributeValue::Scalar(other) => Err(integrity_error(
                owner,
                attribute,
                format!("expected a collection, array or null, got {}", other),
            )),
            AttributeValue::Model(_) => Err(integrity_error(
                owner,
                attribute,
                "expected a collection, array or null, got a model".into(),
            )),
        }
    }
}

fn flag(config: &Map<String, Value>, key: &str) -> Result<bool, ModelError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(ModelError::Config(format!(
            "'{}' must be a boolean, got {}",
            key, other
        ))),
    }
}
