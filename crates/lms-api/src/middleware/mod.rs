//! HTTP middleware.

pub mod tracing_layer;
