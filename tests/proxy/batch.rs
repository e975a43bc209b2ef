//! Batch aggregation over mixed outcomes.

use databind::{Batch, BatchOperation, MemoryProxy, Proxy, ReadOperation, WriteOperation};
use serde_json::json;

use crate::support::{task, task_class};

#[test]
fn one_failure_marks_the_batch_errored() {
    let mut first = ReadOperation::new();
    let mut second = ReadOperation::for_model(2);
    let mut third = WriteOperation::new(Vec::new());
    first.set_success().unwrap();
    second.set_exception("not found").unwrap();
    third.set_success().unwrap();

    let batch = Batch::new(vec![
        BatchOperation::from(first),
        BatchOperation::from(second),
        BatchOperation::from(third),
    ]);

    assert!(!batch.was_successful());
    assert!(batch.has_errored());
    assert_eq!(batch.errored_operations().len(), 1);
    assert_eq!(batch.successful_operations().len(), 2);
    assert!(batch.is_complete());
}

#[test]
fn pending_operation_keeps_batch_incomplete() {
    let mut done = ReadOperation::new();
    done.set_success().unwrap();
    let batch = Batch::new([done, ReadOperation::new()]);

    assert!(!batch.is_complete());
    assert!(!batch.has_errored());
    assert_eq!(batch.successful_operations().len(), 2);
}

#[test]
fn batch_collects_settled_proxy_operations() {
    let class = task_class();
    let proxy = MemoryProxy::new();
    let mut batch = Batch::new(Vec::<BatchOperation>::new());

    let op = proxy
        .create(WriteOperation::for_model(&task(&class, json!({"title": "a"}))))
        .wait()
        .unwrap();
    batch.push(op);
    let op = proxy.read(ReadOperation::for_model(99)).wait().unwrap();
    batch.push(op);
    let op = proxy.read(ReadOperation::new()).wait().unwrap();
    batch.push(op);

    assert_eq!(batch.len(), 3);
    assert!(batch.is_complete());
    assert!(!batch.was_successful());

    let errored = batch.errored_operations();
    let failed_read = errored[0].as_read().unwrap();
    assert_eq!(failed_read.model_id(), Some("99"));

    let listed = batch.operations()[2].result_set().unwrap();
    assert_eq!(listed.total_count(), Some(1));
}
