//! End-to-end CRUD through the in-memory proxy.

use databind::{MemoryProxy, Proxy, ReadOperation, WriteOperation};
use serde_json::json;

use crate::support::{task, task_class};

#[test]
fn crud_lifecycle() {
    let class = task_class();
    let proxy = MemoryProxy::new();

    let draft = task(&class, json!({"title": "write docs", "selected": true}));
    let op = proxy.create(WriteOperation::for_model(&draft)).wait().unwrap();
    assert!(op.was_successful());

    let created = op.result_set().unwrap().records()[0].clone();
    assert_eq!(created, json!({"id": 1, "title": "write docs", "done": false}));

    // The proxy reports the stored form; the caller decides what to apply.
    draft.set("id", created["id"].clone()).unwrap();
    draft.set("done", true).unwrap();
    let op = proxy.update(WriteOperation::for_model(&draft)).wait().unwrap();
    assert!(op.was_successful());

    let op = proxy.read(ReadOperation::for_model(1)).wait().unwrap();
    assert_eq!(op.result_set().unwrap().records()[0]["done"], json!(true));

    let op = proxy.destroy(WriteOperation::for_model(&draft)).wait().unwrap();
    assert!(op.was_successful());

    let op = proxy.read(ReadOperation::for_model(1)).wait().unwrap();
    assert!(op.has_errored());
    assert!(op.result_set().is_none());
}

#[test]
fn paged_read_reports_total_count() {
    let class = task_class();
    let proxy = MemoryProxy::new();
    let tasks = (1..=7)
        .map(|n| task(&class, json!({"title": format!("task {}", n)})))
        .collect();
    proxy.create(WriteOperation::new(tasks)).wait().unwrap();

    let op = proxy
        .read(ReadOperation::new().with_page(2).with_page_size(3))
        .wait()
        .unwrap();
    let result_set = op.result_set().unwrap();
    assert_eq!(result_set.total_count(), Some(7));
    let titles: Vec<_> = result_set.records().iter().map(|r| r["title"].clone()).collect();
    assert_eq!(titles, vec![json!("task 4"), json!("task 5"), json!("task 6")]);
}

#[test]
fn update_is_all_or_nothing() {
    let class = task_class();
    let proxy = MemoryProxy::new();
    let known = task(&class, json!({"id": 1, "title": "known"}));
    proxy.create(WriteOperation::for_model(&known)).wait().unwrap();

    known.set("title", "renamed").unwrap();
    let stranger = task(&class, json!({"id": 2, "title": "stranger"}));
    let op = proxy
        .update(WriteOperation::new(vec![known, stranger]))
        .wait()
        .unwrap();

    assert!(op.has_errored());
    assert_eq!(op.exception().unwrap().to_string(), "record '2' not found");
    assert_eq!(proxy.records().unwrap()[0]["title"], json!("known"));
}
