//! Chunked bulk indexing shared by deployments and ingest sessions.

use serde_json::Value;
use tracing::{debug, warn};

use search_reindexer_repository::{BulkOperation, ClusterError, ClusterGateway};

/// Documents per bulk chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// A single document that failed within a bulk request.
#[derive(Debug, Clone)]
pub struct BulkDocFailure {
    pub doc_id: String,
    pub status: u16,
    pub error_type: String,
    pub reason: String,
}

/// Aggregate outcome of a chunked bulk indexing run.
#[derive(Debug, Clone, Default)]
pub struct ChunkedBulkReport {
    pub successful: u64,
    pub failed: u64,
    pub failures: Vec<BulkDocFailure>,
}

/// Index `(id, document)` pairs into `index` in chunks, refreshing per chunk.
///
/// Per-item failures are recorded in the report and do not abort the run;
/// a transport-level failure does.
pub async fn bulk_index_chunked(
    gateway: &dyn ClusterGateway,
    index: &str,
    documents: &[(String, Value)],
    chunk_size: usize,
) -> Result<ChunkedBulkReport, ClusterError> {
    let mut report = ChunkedBulkReport::default();
    if documents.is_empty() {
        return Ok(report);
    }

    for chunk in documents.chunks(chunk_size.max(1)) {
        let operations: Vec<BulkOperation> = chunk
            .iter()
            .map(|(id, document)| BulkOperation::Index {
                index: index.to_string(),
                id: id.clone(),
                document: document.clone(),
            })
            .collect();

        let response = gateway.bulk(operations, true).await?;
        for outcome in &response.items {
            if outcome.succeeded() {
                report.successful += 1;
            } else {
                report.failed += 1;
                let (error_type, reason) = outcome
                    .error
                    .as_ref()
                    .map(|e| (e.error_type.clone(), e.reason.clone()))
                    .unwrap_or_else(|| ("unknown".to_string(), String::new()));
                report.failures.push(BulkDocFailure {
                    doc_id: outcome.id.clone(),
                    status: outcome.status,
                    error_type,
                    reason,
                });
            }
        }

        debug!(
            index = %index,
            chunk = chunk.len(),
            successful = report.successful,
            failed = report.failed,
            "Indexed bulk chunk"
        );
    }

    if report.failed > 0 {
        warn!(
            index = %index,
            failed = report.failed,
            "bulk indexing completed with per-document failures"
        );
    }

    Ok(report)
}

/// Pull a document id out of a source document.
///
/// Checks `id`, then `recordId` (and the `RecordId` spelling used by the
/// product corpus). Numeric values are rendered in decimal. Returns `None`
/// when the document carries no usable id; callers supply a synthetic one.
pub fn extract_doc_id(document: &Value) -> Option<String> {
    for key in ["id", "recordId", "RecordId"] {
        match document.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
