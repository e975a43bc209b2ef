//! Test domain: a Task model and a threaded proxy that simulates a slow
//! transport.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use databind::{
    settle, Attribute, ConvertOptions, JsonReader, Model, ModelClass, NativeObjectConverter,
    OperationException, Proxy, ProxyConfig, ProxyError, ProxyPromise, ReadOperation, Reader,
    ResultSet, WriteOperation,
};
use serde_json::{json, Value};

pub fn task_class() -> Arc<ModelClass> {
    ModelClass::builder("app.Task")
        .attribute(Attribute::new("title"))
        .attribute(Attribute::new("done").default_value(false))
        .attribute(Attribute::new("selected").persist(false))
        .build()
}

pub fn task(class: &Arc<ModelClass>, data: Value) -> Model {
    Model::from_data(Arc::clone(class), data.as_object().unwrap()).unwrap()
}

/// Echoes written models back after a delay; any task titled `"boom"` fails
/// the whole request.
pub struct SlowProxy {
    reader: Arc<dyn Reader>,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl SlowProxy {
    pub fn new(delay: Duration) -> Self {
        SlowProxy {
            reader: Arc::new(JsonReader::new().data_property("data")),
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(config: ProxyConfig) -> Result<Arc<dyn Proxy>, ProxyError> {
        let delay = match config.option("delayMs") {
            None => 10,
            Some(value) => value.as_u64().ok_or_else(|| {
                ProxyError::InvalidConfig("delayMs must be a positive integer".into())
            })?,
        };
        let mut proxy = SlowProxy::new(Duration::from_millis(delay));
        if config.reader.is_some() || config.option("reader").is_some() {
            proxy.reader = config.resolve_reader()?;
        }
        Ok(Arc::new(proxy))
    }

    fn echo(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay;
        let reader = Arc::clone(&self.reader);
        ProxyPromise::spawn(move || {
            thread::sleep(delay);
            let outcome = echo_payload(&operation).and_then(|payload| {
                reader
                    .read(&payload)
                    .map_err(|e| OperationException::from(e.to_string()))
            });
            settle(operation, outcome)
        })
    }
}

fn echo_payload(operation: &WriteOperation) -> Result<Value, OperationException> {
    let options = ConvertOptions::new().raw(true).persisted_only(true);
    let mut records = Vec::new();
    for model in operation.models() {
        let record = NativeObjectConverter::convert_to_json(&model.into(), &options)
            .map_err(|e| OperationException::from(e.to_string()))?;
        if record["title"] == json!("boom") {
            return Err(json!({"status": 500, "title": "boom"}).into());
        }
        records.push(record);
    }
    let total = records.len();
    Ok(json!({ "data": records, "total": total }))
}

impl Proxy for SlowProxy {
    fn reader(&self) -> &Arc<dyn Reader> {
        &self.reader
    }

    fn create(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        self.echo(operation)
    }

    fn read(&self, operation: ReadOperation) -> ProxyPromise<ReadOperation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay;
        ProxyPromise::spawn(move || {
            thread::sleep(delay);
            settle(operation, Ok(ResultSet::empty()))
        })
    }

    fn update(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        self.echo(operation)
    }

    fn destroy(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        self.echo(operation)
    }
}
