pub mod convert;
pub mod model;
pub mod operation;
pub mod options_store;
pub mod proxy;
pub mod reader;
pub mod result_set;

#[cfg(feature = "emitter")]
pub mod emitter;

pub use convert::{
    ConvertError, ConvertOptions, NativeArray, NativeObject, NativeObjectConverter, NativeValue,
};
pub use model::{
    Attribute, AttributeKind, AttributeValue, ClientId, Collection, CollectionAttribute,
    DataComponent, Model, ModelAttribute, ModelClass, ModelClassBuilder, ModelClassRef,
    ModelError, ModelRegistry, ValueTransform,
};
pub use operation::{
    Batch, BatchOperation, IntoOperations, Operation, OperationError, OperationException,
    OperationStatus, ReadOperation, WriteOperation,
};
pub use options_store::{OptionRecord, OptionsError, OptionsStore};
pub use proxy::{
    settle, MemoryProxy, Proxy, ProxyConfig, ProxyError, ProxyFactory, ProxyPromise,
    ProxyRegistry, ProxySource,
};
pub use reader::{JsonReader, Reader, ReaderError};
pub use result_set::{ResultSet, ResultSetConfig};

#[cfg(feature = "emitter")]
pub use emitter::{EmittableModel, ModelEmitter};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
