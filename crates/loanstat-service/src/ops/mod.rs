//! Operational HTTP endpoints.
//!
//! - `/health`  : database liveness (500 when the probe fails)
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;

pub async fn health(State(state): State<AppState>) -> Response {
    let verdict = state.probe().check().await;
    let status = if verdict.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(verdict.to_json())).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().export();

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
