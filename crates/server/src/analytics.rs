use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use querylane_agent::analytics::{AnalyticsAgent, AnalyticsAnswer};
use querylane_core::{ApplicationError, QueryRequest, ReportRow, ValidatedPlan};
use serde::Serialize;
use tracing::info;

use crate::error::{new_correlation_id, ApiError};

const SERVICE: &str = "analytics_agent";

#[derive(Clone)]
pub struct AnalyticsState {
    agent: Arc<AnalyticsAgent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    pub explanation: String,
    pub row_count: usize,
    pub data: Vec<ReportRow>,
    pub plan: ValidatedPlan,
}

pub fn router(agent: Arc<AnalyticsAgent>) -> Router {
    Router::new().route("/query", post(query)).with_state(AnalyticsState { agent })
}

pub async fn query(
    State(state): State<AnalyticsState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiError::from_rejection(rejection, &correlation_id, SERVICE))?;

    let result = answer(&state, &request, &correlation_id)
        .await
        .map_err(|error| ApiError::from_application(error, &correlation_id, SERVICE))?;

    info!(
        event_name = "analytics.query.completed",
        correlation_id = %correlation_id,
        row_count = result.report.row_count(),
        "analytics query completed"
    );

    Ok(Json(AnalyticsResponse {
        kind: "analytics",
        status: "success",
        explanation: result.explanation,
        row_count: result.report.row_count(),
        data: result.report.rows,
        plan: result.plan,
    }))
}

async fn answer(
    state: &AnalyticsState,
    request: &QueryRequest,
    correlation_id: &str,
) -> Result<AnalyticsAnswer, ApplicationError> {
    let query = request.query_text()?;
    let property_id = request.require_property_id()?;
    info!(
        event_name = "analytics.query.received",
        correlation_id = %correlation_id,
        property_id = %property_id,
        "analytics query received"
    );
    state.agent.answer(query, property_id).await
}
