//! MemoryProxy - in-process backend for testing and development.

use std::ops::DerefMut;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::debug;

use super::{settle, Proxy, ProxyConfig, ProxyError, ProxyPromise};
use crate::convert::{ConvertOptions, NativeObjectConverter};
use crate::model::Model;
use crate::operation::{id_string, Operation, OperationException, ReadOperation, WriteOperation};
use crate::reader::{JsonReader, Reader};
use crate::result_set::ResultSet;

/// Internal stored representation of a record.
struct StoredRecord {
    id: String,
    data: Value,
}

/// In-memory proxy keeping records in insertion order.
///
/// Models are stored in their raw, persisted-only converted form. Records
/// without an identifier get the next free sequential id on create.
/// Clone-friendly via Arc; clones share storage.
#[derive(Clone)]
pub struct MemoryProxy {
    storage: Arc<RwLock<Vec<StoredRecord>>>,
    next_id: Arc<AtomicU64>,
    id_property: String,
    reader: Arc<dyn Reader>,
}

impl Default for MemoryProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProxy {
    /// Create an empty proxy with the default `JsonReader`.
    pub fn new() -> Self {
        Self::with_reader(Arc::new(JsonReader::default()))
    }

    pub fn with_reader(reader: Arc<dyn Reader>) -> Self {
        MemoryProxy {
            storage: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            id_property: "id".to_string(),
            reader,
        }
    }

    /// Factory registered as the `memory` proxy type.
    ///
    /// Recognized options: `data` (initial payload, decoded by the reader) and
    /// `idProperty` (identifier key of seeded records, default `"id"`).
    pub fn from_config(config: ProxyConfig) -> Result<Arc<dyn Proxy>, ProxyError> {
        let mut proxy = MemoryProxy::with_reader(config.resolve_reader()?);

        match config.option("idProperty") {
            None | Some(Value::Null) => {}
            Some(Value::String(id_property)) => proxy.id_property = id_property.clone(),
            Some(other) => {
                return Err(ProxyError::InvalidConfig(format!(
                    "idProperty must be a string, got {}",
                    other
                )))
            }
        }

        if let Some(data) = config.option("data") {
            let seeded = proxy.seed(data)?;
            debug!(records = seeded, "seeded memory proxy");
        }

        Ok(Arc::new(proxy))
    }

    /// Decode `data` with the proxy's reader and append the records.
    ///
    /// Every record is validated before any is stored: a non-object record or
    /// an id that is already taken rejects the whole payload.
    pub fn seed(&self, data: &Value) -> Result<usize, ProxyError> {
        let result_set = self
            .reader
            .read(data)
            .map_err(|e| ProxyError::InvalidConfig(format!("data: {}", e)))?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| ProxyError::LockPoisoned("seed"))?;
        let mut seeded: Vec<StoredRecord> = Vec::with_capacity(result_set.len());

        for record in result_set.into_records() {
            let mut data = match record {
                Value::Object(data) => data,
                other => {
                    return Err(ProxyError::InvalidConfig(format!(
                        "seeded record is not an object: {}",
                        other
                    )))
                }
            };
            let id = match data.get(&self.id_property) {
                None | Some(Value::Null) => {
                    let id = self.next_free_id(&storage, &seeded);
                    data.insert(self.id_property.clone(), Value::from(id));
                    id.to_string()
                }
                Some(id) => {
                    let id = id_string(id.clone());
                    if storage.iter().chain(&seeded).any(|r| r.id == id) {
                        return Err(ProxyError::InvalidConfig(format!(
                            "seeded record '{}' already exists",
                            id
                        )));
                    }
                    id
                }
            };
            seeded.push(StoredRecord {
                id,
                data: Value::Object(data),
            });
        }

        let count = seeded.len();
        storage.extend(seeded);
        Ok(count)
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, ProxyError> {
        Ok(self
            .storage
            .read()
            .map_err(|_| ProxyError::LockPoisoned("len"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, ProxyError> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of the stored records, in insertion order.
    pub fn records(&self) -> Result<Vec<Value>, ProxyError> {
        Ok(self
            .storage
            .read()
            .map_err(|_| ProxyError::LockPoisoned("records"))?
            .iter()
            .map(|r| r.data.clone())
            .collect())
    }

    fn next_free_id(&self, storage: &[StoredRecord], pending: &[StoredRecord]) -> u64 {
        loop {
            let candidate = self.next_id.fetch_add(1, Ordering::SeqCst);
            let key = candidate.to_string();
            if !storage.iter().chain(pending).any(|r| r.id == key) {
                return candidate;
            }
        }
    }

    fn read_storage(&self) -> Result<RwLockReadGuard<'_, Vec<StoredRecord>>, OperationException> {
        self.storage
            .read()
            .map_err(|_| OperationException::from("memory proxy storage lock poisoned"))
    }

    fn write_storage(
        &self,
    ) -> Result<RwLockWriteGuard<'_, Vec<StoredRecord>>, OperationException> {
        self.storage
            .write()
            .map_err(|_| OperationException::from("memory proxy storage lock poisoned"))
    }

    fn create_records(&self, operation: &WriteOperation) -> Result<ResultSet, OperationException> {
        let mut storage = self.write_storage()?;
        let mut created: Vec<StoredRecord> = Vec::with_capacity(operation.models().len());

        for model in operation.models() {
            let (id, mut data) = record_for(model)?;
            let id = match id {
                Some(id) => {
                    if storage.iter().chain(&created).any(|r| r.id == id) {
                        return Err(format!("record '{}' already exists", id).into());
                    }
                    id
                }
                None => {
                    let id = self.next_free_id(&storage, &created);
                    data.insert(model.id_attribute_name().to_string(), Value::from(id));
                    id.to_string()
                }
            };
            created.push(StoredRecord {
                id,
                data: Value::Object(data),
            });
        }

        let records: Vec<Value> = created.iter().map(|r| r.data.clone()).collect();
        storage.extend(created);
        Ok(ResultSet::new(records))
    }

    fn read_records(&self, operation: &ReadOperation) -> Result<ResultSet, OperationException> {
        let storage = self.read_storage()?;

        if let Some(id) = operation.model_id() {
            return storage
                .iter()
                .find(|r| r.id == id)
                .map(|r| ResultSet::new(r.data.clone()).with_total_count(1))
                .ok_or_else(|| format!("record '{}' not found", id).into());
        }

        let (start, take) = page_window(operation);
        let records: Vec<Value> = storage
            .iter()
            .skip(start)
            .take(take)
            .map(|r| r.data.clone())
            .collect();
        Ok(ResultSet::new(records).with_total_count(storage.len() as u64))
    }

    fn update_records(&self, operation: &WriteOperation) -> Result<ResultSet, OperationException> {
        let mut storage = self.write_storage()?;

        // Validate every model before touching storage.
        let mut updates = Vec::with_capacity(operation.models().len());
        for model in operation.models() {
            let (id, data) = record_for(model)?;
            let id = id.ok_or_else(|| OperationException::from("cannot update a record without an id"))?;
            let index = storage
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| OperationException::from(format!("record '{}' not found", id)))?;
            updates.push((index, Value::Object(data)));
        }

        let records: Vec<Value> = updates.iter().map(|(_, data)| data.clone()).collect();
        for (index, data) in updates {
            storage[index].data = data;
        }
        Ok(ResultSet::new(records))
    }

    fn destroy_records(&self, operation: &WriteOperation) -> Result<ResultSet, OperationException> {
        let mut storage = self.write_storage()?;

        let mut ids = Vec::with_capacity(operation.models().len());
        for model in operation.models() {
            let (id, _) = record_for(model)?;
            let id = id.ok_or_else(|| OperationException::from("cannot destroy a record without an id"))?;
            if !storage.iter().any(|r| r.id == id) {
                return Err(format!("record '{}' not found", id).into());
            }
            ids.push(id);
        }

        storage.retain(|r| !ids.contains(&r.id));
        Ok(ResultSet::empty())
    }
}

/// Run `work` unless the operation is already complete, then settle.
fn run<O, F>(action: &'static str, operation: O, work: F) -> ProxyPromise<O>
where
    O: DerefMut<Target = Operation> + Send + 'static,
    F: FnOnce(&O) -> Result<ResultSet, OperationException>,
{
    if operation.is_complete() {
        return ProxyPromise::resolved(settle(operation, Ok(ResultSet::empty())));
    }
    let outcome = work(&operation);
    match &outcome {
        Ok(result_set) => debug!(action, records = result_set.len(), "memory proxy succeeded"),
        Err(exception) => debug!(action, error = %exception, "memory proxy failed"),
    }
    ProxyPromise::resolved(settle(operation, outcome))
}

/// Raw, persisted-only form of a model plus its identifier, if set.
fn record_for(model: &Model) -> Result<(Option<String>, Map<String, Value>), OperationException> {
    let options = ConvertOptions::new().raw(true).persisted_only(true);
    let data = NativeObjectConverter::convert_to_json(&model.into(), &options)
        .map_err(|e| OperationException::from(e.to_string()))?;
    let Value::Object(data) = data else {
        return Err("model did not convert to an object".into());
    };
    let id = match data.get(model.id_attribute_name()) {
        None | Some(Value::Null) => None,
        Some(id) => Some(id_string(id.clone())),
    };
    Ok((id, data))
}

/// Records to skip and take. `limit` wins over paging; pages are 1-based.
/// An offset too large to represent skips every record.
fn page_window(operation: &ReadOperation) -> (usize, usize) {
    let to_usize = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);

    if operation.limit() > 0 {
        return (to_usize(operation.start()), to_usize(operation.limit()));
    }
    if let (Some(page), Some(size)) = (operation.page(), operation.page_size()) {
        if size > 0 {
            let offset = page
                .saturating_sub(1)
                .checked_mul(size)
                .map_or(usize::MAX, to_usize);
            return (offset, to_usize(size));
        }
    }
    (to_usize(operation.start()), usize::MAX)
}

impl Proxy for MemoryProxy {
    fn reader(&self) -> &Arc<dyn Reader> {
        &self.reader
    }

    fn create(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        run("create", operation, |op| self.create_records(op))
    }

    fn read(&self, operation: ReadOperation) -> ProxyPromise<ReadOperation> {
        run("read", operation, |op| self.read_records(op))
    }

    fn update(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        run("update", operation, |op| self.update_records(op))
    }

    fn destroy(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation> {
        run("destroy", operation, |op| self.destroy_records(op))
    }
}
