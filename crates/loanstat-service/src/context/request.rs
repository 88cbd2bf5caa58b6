use tracing::Level;

use crate::obs::logging;

/// Per-request metadata, created by the instrumentation middleware and handed
/// to handlers through request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    path: String,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw request path, used verbatim as the `endpoint` metric label.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Emit a log record carrying this request's method and path.
    pub fn log(&self, level: Level, message: &str) {
        logging::log(Some(self), level, message);
    }
}
