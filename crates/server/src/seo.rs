use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use querylane_agent::seo::{SeoAgent, SeoAnswer};
use querylane_core::seo::dataset::Record;
use querylane_core::{ApplicationError, FilterSpec, QueryRequest};
use serde::Serialize;
use tracing::info;

use crate::error::{new_correlation_id, ApiError};

const SERVICE: &str = "seo_agent";

#[derive(Clone)]
pub struct SeoState {
    agent: Arc<SeoAgent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    pub answer: String,
    pub match_count: usize,
    pub data: Vec<Record>,
    pub filter: Option<FilterSpec>,
}

pub fn router(agent: Arc<SeoAgent>) -> Router {
    Router::new().route("/query", post(query)).with_state(SeoState { agent })
}

pub async fn query(
    State(state): State<SeoState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<SeoResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiError::from_rejection(rejection, &correlation_id, SERVICE))?;

    let result = answer(&state, &request, &correlation_id)
        .await
        .map_err(|error| ApiError::from_application(error, &correlation_id, SERVICE))?;

    info!(
        event_name = "seo.query.completed",
        correlation_id = %correlation_id,
        match_count = result.total_matches,
        "seo query completed"
    );

    Ok(Json(SeoResponse {
        kind: "seo",
        status: "success",
        answer: result.answer,
        match_count: result.total_matches,
        data: result.records,
        filter: result.filter,
    }))
}

async fn answer(
    state: &SeoState,
    request: &QueryRequest,
    correlation_id: &str,
) -> Result<SeoAnswer, ApplicationError> {
    let query = request.query_text()?;
    info!(event_name = "seo.query.received", correlation_id = %correlation_id, "seo query received");
    state.agent.answer(query).await
}
