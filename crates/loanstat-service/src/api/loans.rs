use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::Level;

use loanstat_core::error::LoanstatError;
use loanstat_core::loan::{Loan, LoanStats, NewLoan};

use super::error::ApiError;
use crate::app_state::AppState;
use crate::context::RequestContext;

pub async fn list_loans(State(app): State<AppState>, Extension(ctx): Extension<RequestContext>) -> Json<Vec<Loan>> {
    let loans = app.loans().list();
    ctx.log(Level::DEBUG, &format!("listing {} loans", loans.len()));
    Json(loans)
}

pub async fn get_loan(
    State(app): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<u64>,
) -> Result<Json<Loan>, ApiError> {
    match app.loans().get(id) {
        Some(loan) => Ok(Json(loan)),
        None => {
            ctx.log(Level::INFO, &format!("loan {id} not found"));
            Err(LoanstatError::NotFound(format!("loan {id}")).into())
        }
    }
}

pub async fn create_loan(
    State(app): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<NewLoan>, JsonRejection>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    let Json(new) = payload.map_err(|e| LoanstatError::BadRequest(e.body_text()))?;
    let loan = app.loans().insert(new)?;
    ctx.log(Level::INFO, &format!("loan {} created", loan.id));
    Ok((StatusCode::CREATED, Json(loan)))
}

pub async fn stats(State(app): State<AppState>, Extension(ctx): Extension<RequestContext>) -> Json<LoanStats> {
    let stats = app.loans().stats();
    ctx.log(Level::DEBUG, "computed loan stats");
    Json(stats)
}
