//! Deployment endpoints: promote, rollback, alias status, schema.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use search_reindexer_deploy::DeployColor;

use crate::error::ApiError;
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteQuery {
    pub target_index: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub success: bool,
    pub alias: String,
    pub new_active_index: String,
    pub message: String,
}

/// POST /:alias/promote
pub async fn promote(
    State(state): State<Arc<ApiState>>,
    Path(alias): Path<String>,
    Query(query): Query<PromoteQuery>,
) -> Result<Json<SwapResponse>, ApiError> {
    state.coordinator.promote(&alias, &query.target_index).await?;
    Ok(Json(SwapResponse {
        success: true,
        alias: alias.clone(),
        new_active_index: query.target_index.clone(),
        message: format!("alias {} now serves {}", alias, query.target_index),
    }))
}

/// POST /:alias/rollback
pub async fn rollback(
    State(state): State<Arc<ApiState>>,
    Path(alias): Path<String>,
) -> Result<Json<SwapResponse>, ApiError> {
    let previous_index = state.coordinator.rollback(&alias).await?;
    Ok(Json(SwapResponse {
        success: true,
        alias: alias.clone(),
        new_active_index: previous_index.clone(),
        message: format!("alias {} rolled back to {}", alias, previous_index),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasStatusResponse {
    pub alias: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_color: Option<DeployColor>,
    pub indices: Vec<String>,
}

/// GET /:alias/status
pub async fn alias_status(
    State(state): State<Arc<ApiState>>,
    Path(alias): Path<String>,
) -> Result<Json<AliasStatusResponse>, ApiError> {
    let exists = state.registry.exists(&alias).await?;
    let deployment = state.coordinator.get_status(&alias).await?;
    let indices = state
        .gateway
        .indices_matching(&format!("{}_*", alias))
        .await?;

    Ok(Json(AliasStatusResponse {
        alias,
        exists,
        active_index: deployment.active_index,
        active_color: deployment.active_color,
        indices,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub alias: String,
    pub indices: Vec<String>,
    pub mappings: Value,
}

/// GET /:alias/schema
pub async fn schema(
    State(state): State<Arc<ApiState>>,
    Path(alias): Path<String>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let mappings = state.gateway.get_mappings(&format!("{}*", alias)).await?;
    let indices = mappings
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();

    Ok(Json(SchemaResponse {
        alias,
        indices,
        mappings,
    }))
}
