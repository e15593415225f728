//! # Search Reindexer API
//!
//! HTTP surface over the session manager and deployment coordinator. Pure
//! translation: handlers validate, delegate, and map errors to statuses; no
//! control-plane state lives here.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::ApiState;

/// Maximum accepted request body: large ingest batches are expected.
pub const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .nest("/api/v1/products", products_router())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn products_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/batch/active", get(routes::batch::list_active))
        .route("/batch/:session_id/process", post(routes::batch::process))
        .route("/batch/:session_id/complete", post(routes::batch::complete))
        .route("/batch/:session_id/cancel", post(routes::batch::cancel))
        .route("/batch/:session_id/status", get(routes::batch::status))
        .route("/:alias/batch/start", post(routes::batch::start))
        .route("/:alias/promote", post(routes::deploy::promote))
        .route("/:alias/rollback", post(routes::deploy::rollback))
        .route("/:alias/status", get(routes::deploy::alias_status))
        .route("/:alias/schema", get(routes::deploy::schema))
        .route("/search/text", post(routes::search::text))
        .route("/search/criteria", post(routes::search::criteria))
        .route("/:product_id", get(routes::search::get_product))
}
