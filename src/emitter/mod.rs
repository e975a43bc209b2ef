//! Change notifications for models, backed by `event_emitter_rs`.

mod model_ext;

pub use model_ext::{EmittableModel, ModelEmitter};
