use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use querylane_agent::runtime::{AgentRuntime, OrchestratedAnswer};
use querylane_core::QueryRequest;
use tracing::info;

use crate::error::{new_correlation_id, ApiError};

const SERVICE: &str = "orchestrator";

#[derive(Clone)]
pub struct OrchestratorState {
    runtime: Arc<AgentRuntime>,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/query", post(query)).with_state(OrchestratorState { runtime })
}

pub async fn query(
    State(state): State<OrchestratorState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<OrchestratedAnswer>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiError::from_rejection(rejection, &correlation_id, SERVICE))?;

    let answer = state
        .runtime
        .handle(&request)
        .await
        .map_err(|error| ApiError::from_application(error, &correlation_id, SERVICE))?;

    info!(
        event_name = "orchestrator.query.completed",
        correlation_id = %correlation_id,
        route = answer.route.as_str(),
        "orchestrated query completed"
    );
    Ok(Json(answer))
}
