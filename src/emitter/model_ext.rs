use event_emitter_rs::EventEmitter;
use tracing::trace;

use crate::model::{AttributeValue, Model, ModelError};

/// Extension wrapper that emits change events when a Model's attributes change.
///
/// `set` fires `change:<attribute>` followed by `change`, each with the
/// attribute name as payload. Nothing is emitted when the new value equals
/// the old one. Listeners run on the emitter's own threads.
///
/// # Example
///
/// ```ignore
/// use databind::emitter::EmittableModel;
///
/// let mut emitter = model.with_emitter();
///
/// emitter.on("change:status", |attribute| {
///     println!("{} changed", attribute);
/// });
///
/// emitter.set("status", "shipped")?;
/// ```
pub struct ModelEmitter {
    model: Model,
    event_emitter: EventEmitter,
}

impl ModelEmitter {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            event_emitter: EventEmitter::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Register a listener for an event name.
    pub fn on<F>(&mut self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.event_emitter.on(event, listener);
    }

    /// Set an attribute and emit change events if its value changed.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<bool, ModelError> {
        let changed = self.model.set(name, value)?;
        if changed {
            trace!(model = %self.model.client_id(), attribute = name, "emitting change");
            self.event_emitter
                .emit(&format!("change:{}", name), name.to_string());
            self.event_emitter.emit("change", name.to_string());
        }
        Ok(changed)
    }
}

/// Trait for types that can be extended with emitter capabilities.
pub trait EmittableModel {
    fn with_emitter(self) -> ModelEmitter;
}

impl EmittableModel for Model {
    fn with_emitter(self) -> ModelEmitter {
        ModelEmitter::new(self)
    }
}
