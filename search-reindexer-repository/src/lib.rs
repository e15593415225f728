//! # Search Reindexer Repository
//!
//! This crate provides the typed gateway to the search cluster used by the
//! blue/green reindexer. It includes the gateway trait, the concrete
//! Elasticsearch implementation, wire types, errors, and the product index
//! mapping.

pub mod backend;
pub mod errors;
pub mod interfaces;
pub mod mapping;
#[cfg(any(test, feature = "testsuite"))]
pub mod testing;
pub mod types;

pub use backend::ElasticsearchGateway;
pub use errors::ClusterError;
pub use interfaces::ClusterGateway;
pub use mapping::{MappingProvider, ProductMapping};
pub use types::{
    AliasAction, BulkItemError, BulkItemOutcome, BulkOperation, BulkResponse, ClusterHealth,
    HealthRequest, HealthStatus, IndexStats,
};
