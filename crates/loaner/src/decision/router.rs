use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::LoanApplication;
use super::engine::{AssessmentResponse, DecisionEngine};
use super::offers::catalog_status;
use crate::error::AppError;

#[derive(Clone)]
struct DecisionState {
    engine: Arc<DecisionEngine>,
    timeout: Duration,
}

/// Router builder exposing the assessment and catalog endpoints.
pub fn decision_router(engine: Arc<DecisionEngine>, timeout: Duration) -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route("/predict", post(assess_handler))
        .route("/api/v1/loans/assess", post(assess_handler))
        .route("/api/v1/catalog", get(catalog_handler))
        .with_state(DecisionState { engine, timeout })
}

async fn banner_handler() -> &'static str {
    "Loan decision API is running!"
}

async fn assess_handler(
    State(state): State<DecisionState>,
    payload: Result<Json<LoanApplication>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let Json(application) = payload?;
    let assessment = state
        .engine
        .assess_within(application, state.timeout)
        .await?;
    Ok(Json(assessment.into_response()))
}

async fn catalog_handler(State(state): State<DecisionState>) -> Response {
    Json(catalog_status(state.engine.catalog())).into_response()
}
