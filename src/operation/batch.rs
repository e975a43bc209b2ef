use std::ops::Deref;

use super::{Operation, ReadOperation, WriteOperation};

/// An operation of either kind, as held by a `Batch`.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Read(ReadOperation),
    Write(WriteOperation),
}

impl BatchOperation {
    pub fn as_read(&self) -> Option<&ReadOperation> {
        match self {
            BatchOperation::Read(op) => Some(op),
            BatchOperation::Write(_) => None,
        }
    }

    pub fn as_write(&self) -> Option<&WriteOperation> {
        match self {
            BatchOperation::Write(op) => Some(op),
            BatchOperation::Read(_) => None,
        }
    }
}

impl Deref for BatchOperation {
    type Target = Operation;

    fn deref(&self) -> &Self::Target {
        match self {
            BatchOperation::Read(op) => op.operation(),
            BatchOperation::Write(op) => op.operation(),
        }
    }
}

impl From<ReadOperation> for BatchOperation {
    fn from(op: ReadOperation) -> Self {
        BatchOperation::Read(op)
    }
}

impl From<WriteOperation> for BatchOperation {
    fn from(op: WriteOperation) -> Self {
        BatchOperation::Write(op)
    }
}

/// Types that can be used to build a `Batch`: a single operation or a list.
pub trait IntoOperations {
    fn into_operations(self) -> Vec<BatchOperation>;
}

impl IntoOperations for ReadOperation {
    fn into_operations(self) -> Vec<BatchOperation> {
        vec![self.into()]
    }
}

impl IntoOperations for WriteOperation {
    fn into_operations(self) -> Vec<BatchOperation> {
        vec![self.into()]
    }
}

impl IntoOperations for BatchOperation {
    fn into_operations(self) -> Vec<BatchOperation> {
        vec![self]
    }
}

impl<T: Into<BatchOperation>> IntoOperations for Vec<T> {
    fn into_operations(self) -> Vec<BatchOperation> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<BatchOperation>, const N: usize> IntoOperations for [T; N] {
    fn into_operations(self) -> Vec<BatchOperation> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Operations executed as one logical unit.
///
/// A Batch has no lifecycle of its own; every predicate is derived from its
/// members. Pending members count as not errored.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    operations: Vec<BatchOperation>,
}

impl Batch {
    pub fn new(operations: impl IntoOperations) -> Self {
        Batch {
            operations: operations.into_operations(),
        }
    }

    pub fn push(&mut self, operation: impl Into<BatchOperation>) {
        self.operations.push(operation.into());
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True if no member has errored.
    pub fn was_successful(&self) -> bool {
        !self.operations.iter().any(|op| op.has_errored())
    }

    pub fn has_errored(&self) -> bool {
        !self.was_successful()
    }

    pub fn successful_operations(&self) -> Vec<&BatchOperation> {
        self.operations.iter().filter(|op| !op.has_errored()).collect()
    }

    pub fn errored_operations(&self) -> Vec<&BatchOperation> {
        self.operations.iter().filter(|op| op.has_errored()).collect()
    }

    /// True if every member is complete.
    pub fn is_complete(&self) -> bool {
        self.operations.iter().all(|op| op.is_complete())
    }
}
