//! Proxies - pluggable persistence backends.
//!
//! A proxy receives an operation, performs the transport-specific work,
//! records the outcome on the operation, and settles a `ProxyPromise` with
//! that same operation. Operational failures never fail the promise; they are
//! recorded with `set_exception` so callers (and batches) can inspect mixed
//! outcomes uniformly.
//!
//! ## Example
//!
//! ```ignore
//! use databind::{ProxyConfig, ProxyRegistry, ReadOperation};
//!
//! let registry = ProxyRegistry::with_defaults()?;
//! let proxy = registry.create(ProxyConfig::new("memory"))?;
//!
//! let op = proxy.read(ReadOperation::for_model(1)).wait()?;
//! if op.has_errored() {
//!     eprintln!("read failed: {}", op.exception().unwrap());
//! }
//! ```

mod memory;
mod promise;
mod registry;

use std::fmt;
use std::ops::DerefMut;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::operation::{Operation, OperationException, ReadOperation, WriteOperation};
use crate::reader::{JsonReader, Reader};
use crate::result_set::ResultSet;

pub use memory::MemoryProxy;
pub use promise::ProxyPromise;
pub use registry::{ProxyFactory, ProxyRegistry, ProxySource};

/// The four-method CRUD contract every backend implements.
pub trait Proxy: Send + Sync {
    /// Reader used to decode transport payloads.
    fn reader(&self) -> &Arc<dyn Reader>;

    fn create(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation>;

    fn read(&self, operation: ReadOperation) -> ProxyPromise<ReadOperation>;

    fn update(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation>;

    fn destroy(&self, operation: WriteOperation) -> ProxyPromise<WriteOperation>;
}

/// Error type for proxy setup and promise settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// A proxy type with this name is already registered.
    AlreadyRegistered(String),
    /// The proxy config has no `type`.
    MissingType,
    /// No proxy type is registered under this name.
    UnknownType(String),
    /// The proxy config is invalid for the requested type.
    InvalidConfig(String),
    /// The worker settling a promise went away without settling it.
    Disconnected,
    /// An internal lock was poisoned.
    LockPoisoned(&'static str),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::AlreadyRegistered(name) => {
                write!(f, "proxy type already registered: {}", name)
            }
            ProxyError::MissingType => write!(f, "proxy config has no 'type'"),
            ProxyError::UnknownType(name) => write!(f, "unknown proxy type: {}", name),
            ProxyError::InvalidConfig(msg) => write!(f, "invalid proxy config: {}", msg),
            ProxyError::Disconnected => write!(f, "proxy promise was dropped before settling"),
            ProxyError::LockPoisoned(operation) => {
                write!(f, "proxy lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for ProxyError {}

/// Typed proxy configuration.
///
/// Deserializes from `{"type": "memory", ...}`; every key other than `type` is
/// kept in `options` for the concrete proxy to interpret. A `reader` option
/// holding an object configures a `JsonReader`.
#[derive(Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(skip)]
    pub reader: Option<Arc<dyn Reader>>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ProxyConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        ProxyConfig {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn Reader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// The configured reader, a `JsonReader` built from the `reader` option, or
    /// the default `JsonReader`.
    pub fn resolve_reader(&self) -> Result<Arc<dyn Reader>, ProxyError> {
        if let Some(reader) = &self.reader {
            return Ok(Arc::clone(reader));
        }
        match self.options.get("reader") {
            None | Some(Value::Null) => Ok(Arc::new(JsonReader::default())),
            Some(config) => {
                let reader: JsonReader = serde_json::from_value(config.clone())
                    .map_err(|e| ProxyError::InvalidConfig(format!("reader: {}", e)))?;
                Ok(Arc::new(reader))
            }
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("type_name", &self.type_name)
            .field("has_reader", &self.reader.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Record the outcome of a transport call on `operation` and return it.
///
/// Helper for proxy implementations: `Ok` stores the result set and marks
/// success, `Err` marks failure. An operation that was already complete when
/// handed to the proxy is returned unchanged.
pub fn settle<O>(mut operation: O, outcome: Result<ResultSet, OperationException>) -> O
where
    O: DerefMut<Target = Operation>,
{
    if operation.is_complete() {
        warn!(status = ?operation.status(), "proxy received an operation that was already complete");
        return operation;
    }
    let recorded = match outcome {
        Ok(result_set) => {
            operation.set_result_set(result_set);
            operation.set_success()
        }
        Err(exception) => operation.set_exception(exception),
    };
    debug_assert!(recorded.is_ok());
    operation
}
