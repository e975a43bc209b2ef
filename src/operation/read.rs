use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};

use super::Operation;

/// A read request: one record by id, or a page of records.
#[derive(Debug, Clone, Default)]
pub struct ReadOperation {
    operation: Operation,
    model_id: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
    start: u64,
    limit: u64,
}

impl ReadOperation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a single record. Any JSON value is accepted and normalized to its
    /// string form (`0` becomes `"0"`).
    pub fn for_model(model_id: impl Into<Value>) -> Self {
        Self::new().with_model_id(model_id)
    }

    pub fn with_model_id(mut self, model_id: impl Into<Value>) -> Self {
        self.model_id = Some(id_string(model_id.into()));
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.operation = Operation::with_params(params);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Maximum records to read; 0 means unbounded.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// The requested id, or `None` if no id was set.
    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    pub fn page(&self) -> Option<u64> {
        self.page
    }

    pub fn page_size(&self) -> Option<u64> {
        self.page_size
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn into_operation(self) -> Operation {
        self.operation
    }
}

/// String form of an identifier value; strings are taken verbatim.
pub(crate) fn id_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Deref for ReadOperation {
    type Target = Operation;

    fn deref(&self) -> &Self::Target {
        &self.operation
    }
}

impl DerefMut for ReadOperation {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.operation
    }
}
