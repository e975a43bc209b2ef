//! Operations - ledger entries for persistence requests.
//!
//! An `Operation` records what was asked of a proxy (its params) and what
//! came back (a `ResultSet` and a terminal status). It performs no I/O.
//! Status moves from `Pending` to exactly one of `Succeeded` or `Failed`.

mod batch;
mod read;
mod write;

use std::fmt;

use serde_json::{Map, Value};

use crate::result_set::ResultSet;

pub use batch::{Batch, BatchOperation, IntoOperations};
pub use read::ReadOperation;
pub(crate) use read::id_string;
pub use write::WriteOperation;

/// Opaque failure payload recorded on an errored operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationException {
    Message(String),
    Data(Value),
}

impl fmt::Display for OperationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationException::Message(msg) => write!(f, "{}", msg),
            OperationException::Data(data) => write!(f, "{}", data),
        }
    }
}

impl From<&str> for OperationException {
    fn from(msg: &str) -> Self {
        OperationException::Message(msg.to_string())
    }
}

impl From<String> for OperationException {
    fn from(msg: String) -> Self {
        OperationException::Message(msg)
    }
}

impl From<Value> for OperationException {
    fn from(data: Value) -> Self {
        OperationException::Data(data)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum OperationStatus {
    #[default]
    Pending,
    Succeeded,
    Failed(OperationException),
}

impl OperationStatus {
    fn label(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The operation already reached a terminal status.
    AlreadyComplete { status: &'static str },
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::AlreadyComplete { status } => {
                write!(f, "operation already {}", status)
            }
        }
    }
}

impl std::error::Error for OperationError {}

/// One requested persistence action and its outcome.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    params: Option<Map<String, Value>>,
    result_set: Option<ResultSet>,
    status: OperationStatus,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Map<String, Value>) -> Self {
        Operation {
            params: Some(params),
            ..Self::default()
        }
    }

    /// The params map, created empty on first access.
    pub fn params(&mut self) -> &mut Map<String, Value> {
        self.params.get_or_insert_with(Map::new)
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|params| params.get(key))
    }

    /// Store the result set. A later call replaces an earlier one.
    pub fn set_result_set(&mut self, result_set: ResultSet) {
        self.result_set = Some(result_set);
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        self.result_set.as_ref()
    }

    pub fn take_result_set(&mut self) -> Option<ResultSet> {
        self.result_set.take()
    }

    pub fn set_success(&mut self) -> Result<(), OperationError> {
        self.transition(OperationStatus::Succeeded)
    }

    pub fn set_exception(
        &mut self,
        exception: impl Into<OperationException>,
    ) -> Result<(), OperationError> {
        self.transition(OperationStatus::Failed(exception.into()))
    }

    fn transition(&mut self, next: OperationStatus) -> Result<(), OperationError> {
        if self.is_complete() {
            return Err(OperationError::AlreadyComplete {
                status: self.status.label(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn exception(&self) -> Option<&OperationException> {
        match &self.status {
            OperationStatus::Failed(exception) => Some(exception),
            _ => None,
        }
    }

    pub fn was_successful(&self) -> bool {
        self.status == OperationStatus::Succeeded
    }

    pub fn has_errored(&self) -> bool {
        matches!(self.status, OperationStatus::Failed(_))
    }

    pub fn is_complete(&self) -> bool {
        self.was_successful() || self.has_errored()
    }
}
