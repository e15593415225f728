//! Error types for the deployment control plane.

use thiserror::Error;

use search_reindexer_repository::ClusterError;

use crate::color::DeployColor;

/// Errors that can occur during deployment operations.
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    /// A cluster call failed.
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Alias name is empty or contains whitespace.
    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    /// Tried to create an index that already exists.
    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// A required index does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The alias has no active index but the operation requires one.
    #[error("Alias {0} has no active index")]
    NoActiveIndex(String),

    /// Swap was requested but no staging index exists for the alias.
    #[error("Alias {0} has no staging index to swap to")]
    NoStagingIndex(String),

    /// Swap was requested for a color other than the staging color.
    #[error("Alias {alias}: staging color is {staging}, not {requested}")]
    StagingColorMismatch {
        alias: String,
        requested: DeployColor,
        staging: DeployColor,
    },

    /// Rollback found no index of the previous color.
    #[error("Alias {alias} has no {color} index to roll back to")]
    NoPreviousIndex { alias: String, color: DeployColor },

    /// The active index name carries no recognizable color tag.
    #[error("Cannot determine color of index {0}")]
    UnknownColor(String),

    /// A legacy dash-separated index name was found for the alias.
    ///
    /// Dashed names predate the underscore naming scheme and would break the
    /// lexicographic-timestamp ordering; they must be migrated by hand.
    #[error("Legacy index names present for alias: {0}")]
    LegacyIndexName(String),

    /// Post-ingest validation of the new index failed.
    #[error("Index validation failed: {0}")]
    ValidationFailed(String),

    /// A readiness wait exceeded its deadline.
    #[error("Timed out after {waited_secs}s waiting for index {index}")]
    Timeout { index: String, waited_secs: u64 },
}

impl DeployError {
    /// Validate an alias name: non-empty, no whitespace.
    pub fn check_alias(alias: &str) -> Result<(), DeployError> {
        if alias.is_empty() {
            return Err(DeployError::InvalidAlias("alias must not be empty".into()));
        }
        if alias.chars().any(char::is_whitespace) {
            return Err(DeployError::InvalidAlias(format!(
                "alias must not contain whitespace: {:?}",
                alias
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_alias() {
        assert!(DeployError::check_alias("products").is_ok());
        assert!(DeployError::check_alias("products-test").is_ok());
        assert!(DeployError::check_alias("").is_err());
        assert!(DeployError::check_alias("pro ducts").is_err());
        assert!(DeployError::check_alias("products\t2").is_err());
    }
}
