//! Proxy, operation, and batch integration tests.

mod support;
mod batch;
mod memory;
mod registry;
mod threaded;
