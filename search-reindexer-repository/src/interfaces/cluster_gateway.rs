//! Cluster gateway trait definition.
//!
//! This module defines the abstract interface over the search cluster,
//! allowing for different backend implementations (Elasticsearch, mock, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ClusterError;
use crate::types::{
    AliasAction, BulkOperation, BulkResponse, ClusterHealth, HealthRequest, IndexStats,
};

/// Abstract interface over the search cluster.
///
/// This trait defines every cluster primitive the control plane relies on:
/// bulk indexing with per-item status, atomic alias updates, index lifecycle
/// calls, count, refresh, health, and stats. Implementations are injected
/// into every component, so the whole control plane can run against a mock
/// cluster in tests.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the gateway is shared across
/// request-handler tasks and is safe for concurrent use.
///
/// # Error Handling
///
/// All methods return `Result<T, ClusterError>`. Absence (a missing alias,
/// a 404 on delete) is modeled in the return value, not as an error, wherever
/// callers treat it as a normal outcome.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Execute a bulk request and return per-item outcomes.
    ///
    /// When `refresh` is set, the affected shards are refreshed before the
    /// call returns, making the documents immediately searchable.
    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        refresh: bool,
    ) -> Result<BulkResponse, ClusterError>;

    /// Apply an ordered list of alias actions as a single atomic update.
    ///
    /// Returns the acknowledged bit. The cluster guarantees the whole list
    /// is applied as one transaction, or not at all.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<bool, ClusterError>;

    /// The set of indices currently bound to an alias.
    ///
    /// An absent alias yields an empty set, not an error.
    async fn alias_indices(&self, alias: &str) -> Result<Vec<String>, ClusterError>;

    /// Whether an alias exists.
    async fn alias_exists(&self, alias: &str) -> Result<bool, ClusterError>;

    /// Create an index with the given settings/mappings body.
    ///
    /// If `alias` is given, the alias is bound in the same call. Returns the
    /// acknowledged bit. Creating an index that already exists is an error.
    async fn create_index(
        &self,
        name: &str,
        body: &Value,
        alias: Option<&str>,
    ) -> Result<bool, ClusterError>;

    /// Delete an index. Returns false if the index did not exist.
    async fn delete_index(&self, name: &str) -> Result<bool, ClusterError>;

    /// Whether an index exists.
    async fn index_exists(&self, name: &str) -> Result<bool, ClusterError>;

    /// Names of all indices matching a pattern, sorted ascending.
    ///
    /// Missing indices are ignored; a pattern with no matches yields an
    /// empty list.
    async fn indices_matching(&self, pattern: &str) -> Result<Vec<String>, ClusterError>;

    /// Refresh an index, making recent writes visible to search and count.
    async fn refresh_index(&self, name: &str) -> Result<(), ClusterError>;

    /// Number of documents in an index.
    async fn count(&self, index: &str) -> Result<u64, ClusterError>;

    /// Cluster health, optionally scoped to one index and optionally waiting
    /// for a target status.
    async fn cluster_health(&self, request: HealthRequest) -> Result<ClusterHealth, ClusterError>;

    /// Aggregate statistics for one index.
    async fn index_stats(&self, name: &str) -> Result<IndexStats, ClusterError>;

    /// Fetch a document by id. Returns `None` when the document is absent.
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, ClusterError>;

    /// Execute a search request against an index or alias.
    async fn search(&self, index: &str, body: Value) -> Result<Value, ClusterError>;

    /// Mappings of all indices matching a pattern, keyed by index name.
    async fn get_mappings(&self, pattern: &str) -> Result<Value, ClusterError>;
}
