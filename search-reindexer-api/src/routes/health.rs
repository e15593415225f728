//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use search_reindexer_repository::HealthRequest;

use crate::state::ApiState;

/// GET /health
///
/// Always 200; connectivity to the cluster is reported in the body so load
/// balancers keep routing while operators see the degradation.
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<Value> {
    match state.gateway.cluster_health(HealthRequest::cluster()).await {
        Ok(health) => Json(json!({
            "api": "ok",
            "elasticsearch": {
                "connected": true,
                "cluster": health.cluster_name,
                "status": health.status
            }
        })),
        Err(e) => {
            warn!(error = %e, "cluster unreachable during health check");
            Json(json!({
                "api": "ok",
                "elasticsearch": {
                    "connected": false
                }
            }))
        }
    }
}
