//! Session endpoints: start, process, complete, cancel, status.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use search_reindexer_deploy::{DeploymentState, DeploymentStrategy};
use search_reindexer_session::{BatchProcessResult, IngestSession};

use crate::error::ApiError;
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuery {
    pub strategy: Option<String>,
    pub estimated_total: Option<u64>,
}

/// POST /:alias/batch/start
pub async fn start(
    State(state): State<Arc<ApiState>>,
    Path(alias): Path<String>,
    Query(query): Query<StartQuery>,
) -> Result<Json<IngestSession>, ApiError> {
    let strategy = match query.strategy.as_deref() {
        None => DeploymentStrategy::Safe,
        Some(s) => DeploymentStrategy::parse(s)
            .ok_or_else(|| ApiError::bad_request(format!("unsupported strategy: {}", s)))?,
    };

    let session = state
        .sessions
        .start(&alias, strategy, query.estimated_total)
        .await?;
    Ok(Json(session))
}

/// POST /batch/:session_id/process
///
/// Partial failures are a 200 with `failed > 0` and per-document errors;
/// only whole-batch rejections surface as error statuses.
pub async fn process(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    Json(documents): Json<Vec<Value>>,
) -> Result<Json<BatchProcessResult>, ApiError> {
    let result = state.sessions.process_batch(&session_id, documents).await?;
    Ok(Json(result))
}

/// POST /batch/:session_id/complete
pub async fn complete(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DeploymentState>, ApiError> {
    let state = state.sessions.complete(&session_id).await?;
    Ok(Json(state))
}

/// POST /batch/:session_id/cancel
pub async fn cancel(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.cancel(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /batch/:session_id/status
pub async fn status(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<IngestSession>, ApiError> {
    state
        .sessions
        .get_session(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {}", session_id)))
}

/// GET /batch/active
pub async fn list_active(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<IngestSession>>, ApiError> {
    Ok(Json(state.sessions.list_active().await))
}
