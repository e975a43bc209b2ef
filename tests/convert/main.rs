//! Graph conversion integration tests.

mod support;
mod class_refs;
mod cycles;
mod order;
