//! API error type with HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use search_reindexer_deploy::DeployError;
use search_reindexer_repository::ClusterError;
use search_reindexer_session::SessionError;

/// Error type for the HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    /// Map error kind to HTTP status.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 - invalid arguments and session/staging precondition
            // violations
            ApiError::Session(SessionError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Session(SessionError::Conflict(_)) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // 404 - absent sessions, aliases, indices
            ApiError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,

            // Deployment errors carry their own kinds, nested or not.
            ApiError::Session(SessionError::Deploy(e)) => deploy_status(e),
            ApiError::Deploy(e) => deploy_status(e),

            // 500 - cluster and transport failures
            ApiError::Session(SessionError::Cluster(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Cluster(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn deploy_status(error: &DeployError) -> StatusCode {
    match error {
        DeployError::InvalidAlias(_) => StatusCode::BAD_REQUEST,
        DeployError::IndexExists(_) => StatusCode::BAD_REQUEST,
        DeployError::NoStagingIndex(_) => StatusCode::BAD_REQUEST,
        DeployError::StagingColorMismatch { .. } => StatusCode::BAD_REQUEST,

        DeployError::IndexNotFound(_) => StatusCode::NOT_FOUND,
        DeployError::NoActiveIndex(_) => StatusCode::NOT_FOUND,
        DeployError::NoPreviousIndex { .. } => StatusCode::NOT_FOUND,

        DeployError::UnknownColor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DeployError::LegacyIndexName(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DeployError::ValidationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DeployError::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DeployError::Cluster(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };
        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(r#"{{"error":"{}","status":{}}}"#, self, status.as_u16())
        });
        (status, [("content-type", "application/json")], json).into_response()
    }
}
