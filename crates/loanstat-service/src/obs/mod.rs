//! Observability: metrics registry, request instrumentation, log formatting.
//!
//! The registry is a plain value built at startup and shared through
//! `AppState`; nothing here is a global. Metrics are rendered by the
//! `/metrics` handler.

pub mod logging;
pub mod metrics;
pub mod middleware;
