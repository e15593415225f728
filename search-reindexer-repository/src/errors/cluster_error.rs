//! Cluster error types.
//!
//! This module defines the error types that can occur while talking to the
//! search cluster.

use thiserror::Error;

/// Errors that can occur during cluster gateway operations.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    /// Failed to establish a connection to the cluster.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A request failed at the transport layer.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The cluster returned a response that could not be parsed.
    #[error("Response error: {0}")]
    ResponseError(String),

    /// A mutation was submitted but the cluster did not acknowledge it.
    #[error("Not acknowledged: {0}")]
    NotAcknowledged(String),

    /// The cluster returned an unexpected HTTP status.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl ClusterError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a response error.
    pub fn response(msg: impl Into<String>) -> Self {
        Self::ResponseError(msg.into())
    }

    /// Create a not-acknowledged error.
    pub fn not_acknowledged(msg: impl Into<String>) -> Self {
        Self::NotAcknowledged(msg.into())
    }

    /// Create an unexpected-status error.
    pub fn unexpected(status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }
}
