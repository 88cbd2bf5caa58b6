//! Business routes under `/api`.
//!
//! Handlers receive the per-request [`RequestContext`](crate::context::RequestContext)
//! through an `Extension` inserted by the instrumentation middleware.

pub mod error;
pub mod loans;

use axum::{routing::get, Router};

use crate::app_state::AppState;

pub use error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/api/loans/:id", get(loans::get_loan))
        .route("/api/stats", get(loans::stats))
}
