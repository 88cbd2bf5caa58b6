//! Request-scoped context passed explicitly through handlers.
//!
//! Nothing here is stored in shared state; each in-flight request owns its own
//! `RequestContext`.

pub mod request;

pub use request::RequestContext;
