//! Request and response types for cluster gateway operations.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single operation within a bulk request.
///
/// Each operation expands to an action header line and, for indexing, a
/// source line in the bulk body.
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Index a document under the given id, replacing any existing document.
    Index {
        index: String,
        id: String,
        document: Value,
    },
    /// Delete the document with the given id.
    Delete { index: String, id: String },
}

impl BulkOperation {
    /// The target index of this operation.
    pub fn index(&self) -> &str {
        match self {
            BulkOperation::Index { index, .. } => index,
            BulkOperation::Delete { index, .. } => index,
        }
    }

    /// The document id of this operation.
    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Index { id, .. } => id,
            BulkOperation::Delete { id, .. } => id,
        }
    }

    /// The action header line for the bulk body.
    pub fn header(&self) -> Value {
        match self {
            BulkOperation::Index { index, id, .. } => {
                json!({ "index": { "_index": index, "_id": id } })
            }
            BulkOperation::Delete { index, id } => {
                json!({ "delete": { "_index": index, "_id": id } })
            }
        }
    }
}

/// Error payload reported by the cluster for a single bulk item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemError {
    /// The cluster's error type, e.g. `mapper_parsing_exception`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of a single item within a bulk response.
#[derive(Debug, Clone)]
pub struct BulkItemOutcome {
    /// Operation kind as reported by the cluster (`index`, `delete`, ...).
    pub operation: String,
    /// Document id the item applied to.
    pub id: String,
    /// Per-item HTTP status code.
    pub status: u16,
    /// Error payload, if the item failed.
    pub error: Option<BulkItemError>,
}

impl BulkItemOutcome {
    /// Whether this item succeeded: status 200 or 201 and no error payload.
    pub fn succeeded(&self) -> bool {
        matches!(self.status, 200 | 201) && self.error.is_none()
    }
}

/// Parsed response of a bulk request.
#[derive(Debug, Clone)]
pub struct BulkResponse {
    /// True if any item in the request failed.
    pub any_errors: bool,
    /// Per-item outcomes, in submission order.
    pub items: Vec<BulkItemOutcome>,
}

/// A single alias mutation within an atomic aliases update.
///
/// The cluster applies the whole action list as one transaction; this is the
/// only mechanism through which alias membership ever changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    /// Bind `alias` to `index`.
    Add { index: String, alias: String },
    /// Unbind `alias` from `index`.
    Remove { index: String, alias: String },
}

impl AliasAction {
    /// Serialize into the cluster's action object form.
    pub fn to_value(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => {
                json!({ "add": { "index": index, "alias": alias } })
            }
            AliasAction::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}

/// Cluster or index health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Green,
    Yellow,
    Red,
}

impl HealthStatus {
    /// Parse from the cluster's lowercase status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "green" => Some(HealthStatus::Green),
            "yellow" => Some(HealthStatus::Yellow),
            "red" => Some(HealthStatus::Red),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        };
        f.write_str(s)
    }
}

/// Parameters of a cluster health request.
#[derive(Debug, Clone, Default)]
pub struct HealthRequest {
    /// Restrict the health report to one index.
    pub index: Option<String>,
    /// Block until the cluster reaches at least this status.
    pub wait_for_status: Option<HealthStatus>,
    /// Server-side timeout for the wait.
    pub timeout: Option<Duration>,
}

impl HealthRequest {
    /// Health of the whole cluster, no waiting.
    pub fn cluster() -> Self {
        Self::default()
    }

    /// Health of a single index, no waiting.
    pub fn for_index(index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..Self::default()
        }
    }

    /// Wait for at least the given status.
    pub fn wait_for(mut self, status: HealthStatus, timeout: Duration) -> Self {
        self.wait_for_status = Some(status);
        self.timeout = Some(timeout);
        self
    }
}

/// Parsed cluster health response.
#[derive(Debug, Clone)]
pub struct ClusterHealth {
    /// Overall status of the requested scope.
    pub status: HealthStatus,
    /// Name of the cluster.
    pub cluster_name: String,
    /// Number of nodes in the cluster.
    pub number_of_nodes: u64,
    /// True if a requested wait expired before the status was reached.
    pub timed_out: bool,
}

/// Aggregate statistics for a single index.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of documents in the index.
    pub doc_count: u64,
    /// Store size in bytes.
    pub store_size_bytes: u64,
    /// Indexing operation total reported by the cluster.
    pub indexing_rate: u64,
    /// Search query total reported by the cluster.
    pub search_rate: u64,
}
