//! Proxies that settle from a background thread.

use std::sync::atomic::Ordering;
use std::sync::mpsc::channel;
use std::time::Duration;

use databind::{Batch, BatchOperation, OperationException, Proxy, WriteOperation};
use serde_json::json;

use crate::support::{task, task_class, SlowProxy};

#[test]
fn promise_settles_with_the_same_operation() {
    let class = task_class();
    let proxy = SlowProxy::new(Duration::from_millis(20));

    let mut promise = proxy.create(WriteOperation::for_model(&task(
        &class,
        json!({"id": 3, "title": "ship"}),
    )));
    assert!(promise.wait_timeout(Duration::from_secs(5)).unwrap());

    let op = promise.wait().unwrap();
    assert!(op.was_successful());
    let result_set = op.result_set().unwrap();
    assert_eq!(result_set.total_count(), Some(1));
    assert_eq!(result_set.records()[0]["id"], json!(3));
    assert_eq!(proxy.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn transport_failure_is_recorded_not_raised() {
    let class = task_class();
    let proxy = SlowProxy::new(Duration::from_millis(5));

    let op = proxy
        .update(WriteOperation::for_model(&task(&class, json!({"title": "boom"}))))
        .wait()
        .unwrap();

    assert!(op.has_errored());
    assert_eq!(
        op.exception(),
        Some(&OperationException::Data(json!({"status": 500, "title": "boom"})))
    );
}

#[test]
fn then_continuation_sees_the_settled_operation() {
    let class = task_class();
    let proxy = SlowProxy::new(Duration::from_millis(5));
    let (tx, rx) = channel();

    let promise = proxy
        .destroy(WriteOperation::for_model(&task(&class, json!({"id": 1}))))
        .then(move |op| {
            let _ = tx.send(op.was_successful());
            op
        });

    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    assert!(promise.wait().unwrap().is_complete());
}

#[test]
fn concurrent_requests_feed_one_batch() {
    let class = task_class();
    let proxy = SlowProxy::new(Duration::from_millis(10));

    let promises: Vec<_> = ["a", "boom", "c"]
        .iter()
        .map(|title| proxy.create(WriteOperation::for_model(&task(&class, json!({"title": title})))))
        .collect();

    let operations: Vec<BatchOperation> = promises
        .into_iter()
        .map(|promise| promise.wait().unwrap().into())
        .collect();
    let batch = Batch::new(operations);

    assert!(batch.is_complete());
    assert_eq!(batch.successful_operations().len(), 2);
    assert_eq!(batch.errored_operations().len(), 1);
}
