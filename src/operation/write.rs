use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};

use super::Operation;
use crate::model::Model;

/// A create, update, or destroy request for one or more Models.
#[derive(Debug, Clone, Default)]
pub struct WriteOperation {
    operation: Operation,
    models: Vec<Model>,
}

impl WriteOperation {
    pub fn new(models: Vec<Model>) -> Self {
        WriteOperation {
            operation: Operation::new(),
            models,
        }
    }

    pub fn for_model(model: &Model) -> Self {
        Self::new(vec![model.clone()])
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.operation = Operation::with_params(params);
        self
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn into_operation(self) -> Operation {
        self.operation
    }
}

impl Deref for WriteOperation {
    type Target = Operation;

    fn deref(&self) -> &Self::Target {
        &self.operation
    }
}

impl DerefMut for WriteOperation {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.operation
    }
}
