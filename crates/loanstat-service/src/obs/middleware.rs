//! Per-request instrumentation middleware.
//!
//! Records, once per request:
//! - `http_requests_total{method, endpoint}` - Counter
//! - `http_request_duration_seconds{endpoint}` - Histogram
//!
//! `endpoint` is the raw request path. Paths carrying ids (`/api/loans/17`)
//! produce one series per distinct id.
//!
//! Recording happens when [`RequestGuard`] is dropped, so a handler that
//! panics or a client that disconnects mid-flight (the request future is
//! dropped) is still counted exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::Level;

use crate::context::RequestContext;
use crate::obs::logging;
use crate::obs::metrics::{MetricRegistry, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Owns the start instant of one in-flight request.
pub struct RequestGuard {
    metrics: Arc<MetricRegistry>,
    ctx: RequestContext,
    start: Instant,
    status: Option<StatusCode>,
}

impl RequestGuard {
    pub fn start(metrics: Arc<MetricRegistry>, ctx: RequestContext) -> Self {
        Self {
            metrics,
            ctx,
            start: Instant::now(),
            status: None,
        }
    }

    /// Mark the request as answered. Recording still waits for drop.
    pub fn complete(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn record(&self, elapsed: Duration) {
        let method = self.ctx.method();
        let endpoint = self.ctx.path();

        if let Err(e) = self
            .metrics
            .increment_counter(HTTP_REQUESTS_TOTAL, &[("method", method), ("endpoint", endpoint)])
        {
            tracing::warn!(error = %e, "dropping request counter sample");
        }
        if let Err(e) = self
            .metrics
            .observe(HTTP_REQUEST_DURATION_SECONDS, &[("endpoint", endpoint)], elapsed)
        {
            tracing::warn!(error = %e, "dropping request duration sample");
        }
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.record(elapsed);

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match self.status {
            Some(status) => logging::log(
                Some(&self.ctx),
                Level::INFO,
                &format!("request completed status={} elapsed_ms={:.3}", status.as_u16(), elapsed_ms),
            ),
            None => logging::log(
                Some(&self.ctx),
                Level::WARN,
                &format!("request aborted elapsed_ms={:.3}", elapsed_ms),
            ),
        }
    }
}

/// Axum middleware: attach a [`RequestContext`] to the request and time it.
///
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(metrics, track_requests));
/// ```
pub async fn track_requests(State(metrics): State<Arc<MetricRegistry>>, mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new(request.method().as_str(), request.uri().path());
    request.extensions_mut().insert(ctx.clone());

    let mut guard = RequestGuard::start(metrics, ctx);
    let response = next.run(request).await;
    guard.complete(response.status());

    response
}
