//! Error types for cluster gateway operations.

mod cluster_error;

pub use cluster_error::ClusterError;
