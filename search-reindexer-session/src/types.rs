//! Session data types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use search_reindexer_deploy::{DeployColor, DeploymentStrategy, bulk::DEFAULT_CHUNK_SIZE};

/// Upper bound on retained per-session error entries.
pub const MAX_SESSION_ERRORS: usize = 100;

/// Lifecycle status of an ingest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Expired,
}

impl SessionStatus {
    /// Terminal sessions never mutate again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// One recorded session error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// A streaming ingest session targeting one staging index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSession {
    pub session_id: String,
    pub alias: String,
    pub target_index: String,
    pub target_color: DeployColor,
    pub strategy: DeploymentStrategy,
    pub total_batches: u64,
    pub processed_batches: u64,
    pub total_documents: u64,
    pub processed_documents: u64,
    pub failed_documents: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total: Option<u64>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_batch_at: DateTime<Utc>,
    pub errors: Vec<SessionErrorEntry>,
}

impl IngestSession {
    /// Append an error, dropping the newest entries past the retention cap.
    ///
    /// The list is bounded so a misbehaving source cannot grow a session
    /// without limit; the earliest errors are the ones kept.
    pub fn record_error(&mut self, entry: SessionErrorEntry) {
        if self.errors.len() < MAX_SESSION_ERRORS {
            self.errors.push(entry);
        }
    }

    /// Ingest progress as a percentage of the estimated total, if one was
    /// provided at session start.
    pub fn progress(&self) -> Option<f64> {
        self.estimated_total
            .filter(|estimated| *estimated > 0)
            .map(|estimated| 100.0 * self.processed_documents as f64 / estimated as f64)
    }
}

/// Outcome of one processed batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessResult {
    pub session_id: String,
    pub batch_number: u64,
    pub successful: u64,
    pub failed: u64,
    pub errors: Vec<SessionErrorEntry>,
    pub session_status: SessionStatus,
    pub total_processed: u64,
    pub total_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Tunables for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session expires.
    pub session_timeout: Duration,
    /// How often the expiry sweep runs.
    pub sweep_interval: Duration,
    /// Maximum documents per batch.
    pub max_batch_size: usize,
    /// Documents per bulk chunk.
    pub chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
            max_batch_size: 1000,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
