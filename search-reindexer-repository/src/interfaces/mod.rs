//! Trait definitions for cluster access.

mod cluster_gateway;

pub use cluster_gateway::ClusterGateway;
