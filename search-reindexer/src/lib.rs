//! # Search Reindexer
//!
//! Entry point and configuration for the blue/green search reindexer
//! service.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during service initialization.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Cluster error.
    #[error("Cluster error: {0}")]
    ClusterError(#[from] search_reindexer_repository::ClusterError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
