//! Error types for ingest sessions.

use thiserror::Error;

use search_reindexer_deploy::DeployError;
use search_reindexer_repository::ClusterError;

/// Errors that can occur during session operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// A request argument was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The session does not exist (or has expired and been removed).
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The session exists but is not in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A control-plane operation failed.
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// A cluster call failed.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl SessionError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound(session_id.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
