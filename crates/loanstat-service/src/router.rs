//! Axum router wiring.
//!
//! Every route, `/health` and `/metrics` included, runs behind the request
//! instrumentation layer. Handler panics are turned into a 500 inside that
//! layer, so the recorded status matches what the client receives.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;

use crate::obs::metrics::MetricRegistry;
use crate::obs::middleware::track_requests;
use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    let metrics = state.metrics();
    instrument(
        Router::new()
            .route("/health", get(ops::health))
            .route("/metrics", get(ops::metrics))
            .merge(api::routes()),
        metrics,
    )
    .with_state(state)
}

/// Wrap `router` with panic recovery (inner) and request instrumentation
/// (outer).
pub fn instrument<S>(router: Router<S>, metrics: Arc<MetricRegistry>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(metrics, track_requests))
}
