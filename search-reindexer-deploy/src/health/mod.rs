//! Health probe: index readiness validation and polling.
//!
//! The probe never mutates state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use search_reindexer_repository::{
    ClusterGateway, HealthRequest, HealthStatus,
};

use crate::errors::DeployError;

/// Options for a readiness wait.
#[derive(Debug, Clone)]
pub struct WaitReadyOptions {
    /// Wall-clock deadline for the whole wait.
    pub timeout: Duration,
    /// Pause between readiness checks.
    pub check_interval: Duration,
    /// If set, the index must report at least this many documents.
    pub expected_doc_count: Option<u64>,
}

impl Default for WaitReadyOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            check_interval: Duration::from_secs(2),
            expected_doc_count: None,
        }
    }
}

impl WaitReadyOptions {
    /// The five-minute wait used after a full ingest.
    pub fn post_ingest(expected_doc_count: u64) -> Self {
        Self {
            timeout: Duration::from_secs(300),
            expected_doc_count: Some(expected_doc_count),
            ..Self::default()
        }
    }
}

/// Human-readable statistics for one index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexHealthReport {
    pub doc_count: u64,
    pub store_size: String,
    pub indexing_rate: u64,
    pub search_rate: u64,
    pub health: HealthStatus,
}

/// Validates that an index is ready to serve queries.
pub struct HealthProbe {
    gateway: Arc<dyn ClusterGateway>,
}

impl HealthProbe {
    pub fn new(gateway: Arc<dyn ClusterGateway>) -> Self {
        Self { gateway }
    }

    /// Whether the index exists, is not red, and reports stats.
    ///
    /// Yellow is acceptable: a single-node cluster never reaches green on a
    /// replicated index.
    pub async fn validate(&self, index: &str) -> Result<bool, DeployError> {
        if !self.gateway.index_exists(index).await? {
            return Ok(false);
        }

        let health = self
            .gateway
            .cluster_health(HealthRequest::for_index(index))
            .await?;
        if health.status == HealthStatus::Red {
            return Ok(false);
        }

        match self.gateway.index_stats(index).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(index = %index, error = %e, "stats retrieval failed during validation");
                Ok(false)
            }
        }
    }

    /// Poll until the index is ready or the deadline passes.
    ///
    /// Each tick: the index must exist, reach the expected document count if
    /// one was given, and report a non-red health with
    /// `wait_for_status=yellow`. Transient errors within a tick are swallowed
    /// and retried; only the wall-clock deadline fails the wait.
    pub async fn wait_ready(
        &self,
        index: &str,
        options: WaitReadyOptions,
    ) -> Result<(), DeployError> {
        let start = Instant::now();
        loop {
            match self.check_ready(index, options.expected_doc_count).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    debug!(index = %index, error = %e, "readiness check errored, retrying");
                }
            }

            if start.elapsed() >= options.timeout {
                return Err(DeployError::Timeout {
                    index: index.to_string(),
                    waited_secs: start.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(options.check_interval).await;
        }
    }

    async fn check_ready(
        &self,
        index: &str,
        expected_doc_count: Option<u64>,
    ) -> Result<bool, DeployError> {
        if !self.gateway.index_exists(index).await? {
            return Ok(false);
        }

        if let Some(expected) = expected_doc_count {
            let count = self.gateway.count(index).await?;
            if count < expected {
                debug!(index = %index, count, expected, "document count below expectation");
                return Ok(false);
            }
        }

        let health = self
            .gateway
            .cluster_health(
                HealthRequest::for_index(index)
                    .wait_for(HealthStatus::Yellow, Duration::from_secs(10)),
            )
            .await?;
        Ok(health.status != HealthStatus::Red)
    }

    /// Aggregate statistics with a human-formatted store size.
    pub async fn stats(&self, index: &str) -> Result<IndexHealthReport, DeployError> {
        let stats = self.gateway.index_stats(index).await?;
        let health = self
            .gateway
            .cluster_health(HealthRequest::for_index(index))
            .await?;

        Ok(IndexHealthReport {
            doc_count: stats.doc_count,
            store_size: format_bytes(stats.store_size_bytes),
            indexing_rate: stats.indexing_rate,
            search_rate: stats.search_rate,
            health: health.status,
        })
    }
}

/// Format a byte count for operators ("532 B", "1.2 MB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
