//! Session manager: start, process, complete, cancel, expire.
//!
//! Sessions live in one map guarded by a mutex; each session carries its own
//! lock so operations on a single session are serialized (at most one
//! in-flight batch) while distinct sessions progress in parallel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use search_reindexer_deploy::bulk::bulk_index_chunked;
use search_reindexer_deploy::{
    extract_doc_id, DeployError, DeploymentCoordinator, DeploymentState, DeploymentStatus,
    DeploymentStrategy, HealthProbe, IndexLifecycle, WaitReadyOptions,
};
use search_reindexer_repository::ClusterGateway;

use crate::errors::SessionError;
use crate::types::{
    BatchProcessResult, IngestSession, SessionConfig, SessionErrorEntry, SessionStatus,
};

type SessionHandle = Arc<Mutex<IngestSession>>;

/// Manages streaming ingest sessions, one staging index each.
pub struct SessionManager {
    gateway: Arc<dyn ClusterGateway>,
    coordinator: Arc<DeploymentCoordinator>,
    lifecycle: Arc<IndexLifecycle>,
    probe: Arc<HealthProbe>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        gateway: Arc<dyn ClusterGateway>,
        coordinator: Arc<DeploymentCoordinator>,
        lifecycle: Arc<IndexLifecycle>,
        probe: Arc<HealthProbe>,
    ) -> Self {
        Self::with_config(gateway, coordinator, lifecycle, probe, SessionConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn ClusterGateway>,
        coordinator: Arc<DeploymentCoordinator>,
        lifecycle: Arc<IndexLifecycle>,
        probe: Arc<HealthProbe>,
        config: SessionConfig,
    ) -> Self {
        Self {
            gateway,
            coordinator,
            lifecycle,
            probe,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a session against an alias.
    ///
    /// Derives the current deployment state, targets the opposite color
    /// (blue when nothing is active), and creates the mapped staging index.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        alias: &str,
        strategy: DeploymentStrategy,
        estimated_total: Option<u64>,
    ) -> Result<IngestSession, SessionError> {
        let state = self.coordinator.get_status(alias).await?;
        let target_color = state.next_color();
        let target_index = self.lifecycle.generate_name(alias, Some(target_color));

        self.lifecycle.create(&target_index, None).await?;

        let now = Utc::now();
        let session = IngestSession {
            session_id: generate_session_id(),
            alias: alias.to_string(),
            target_index,
            target_color,
            strategy,
            total_batches: 0,
            processed_batches: 0,
            total_documents: 0,
            processed_documents: 0,
            failed_documents: 0,
            estimated_total,
            status: SessionStatus::Active,
            created_at: now,
            last_batch_at: now,
            errors: Vec::new(),
        };

        info!(
            session_id = %session.session_id,
            alias = %alias,
            target_index = %session.target_index,
            target_color = %target_color,
            "Started ingest session"
        );

        self.sessions
            .lock()
            .await
            .insert(session.session_id.clone(), Arc::new(Mutex::new(session.clone())));
        Ok(session)
    }

    /// Process one batch of documents into the session's staging index.
    ///
    /// Document ids are normalized (`id`, then `recordId`, then a synthetic
    /// id); a batch containing duplicate ids is rejected whole, before any
    /// cluster write. Per-document bulk failures are recorded, not raised.
    pub async fn process_batch(
        &self,
        session_id: &str,
        documents: Vec<Value>,
    ) -> Result<BatchProcessResult, SessionError> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;

        if session.status != SessionStatus::Active {
            return Err(SessionError::conflict(format!(
                "session {} is {:?}, not active",
                session_id, session.status
            )));
        }
        if documents.is_empty() {
            return Err(SessionError::invalid_argument(
                "batch must contain at least one document",
            ));
        }
        if documents.len() > self.config.max_batch_size {
            return Err(SessionError::invalid_argument(format!(
                "batch of {} documents exceeds the {}-document limit",
                documents.len(),
                self.config.max_batch_size
            )));
        }

        let batch_number = session.total_batches + 1;
        let epoch_ms = Utc::now().timestamp_millis();
        let mut seen = HashSet::with_capacity(documents.len());
        let mut keyed = Vec::with_capacity(documents.len());
        for (i, document) in documents.into_iter().enumerate() {
            let doc_id = extract_doc_id(&document).unwrap_or_else(|| {
                format!("doc_{}_{}_{}_{}", session_id, batch_number, i, epoch_ms)
            });
            if !seen.insert(doc_id.clone()) {
                // Reject before the bulk call; no partial writes, counters
                // untouched.
                return Err(SessionError::invalid_argument(format!(
                    "duplicate document id in batch: {}",
                    doc_id
                )));
            }
            keyed.push((doc_id, document));
        }

        // Batch numbers are assigned at arrival; the per-session lock holds
        // for the whole call, so numbering and counters stay ordered.
        session.total_batches = batch_number;
        session.last_batch_at = Utc::now();
        let document_count = keyed.len() as u64;

        let report = match bulk_index_chunked(
            self.gateway.as_ref(),
            &session.target_index,
            &keyed,
            self.config.chunk_size,
        )
        .await
        {
            Ok(report) => report,
            Err(e) => {
                session.record_error(SessionErrorEntry {
                    batch_number: Some(batch_number),
                    phase: None,
                    document_ref: None,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                // The session stays active; further batches are accepted.
                return Err(e.into());
            }
        };

        session.processed_batches += 1;
        session.total_documents += document_count;
        session.processed_documents += report.successful;
        session.failed_documents += report.failed;
        session.last_batch_at = Utc::now();

        let mut batch_errors = Vec::with_capacity(report.failures.len());
        for failure in &report.failures {
            let entry = SessionErrorEntry {
                batch_number: Some(batch_number),
                phase: None,
                document_ref: Some(failure.doc_id.clone()),
                error: format!(
                    "{} (status {}): {}",
                    failure.error_type, failure.status, failure.reason
                ),
                timestamp: Utc::now(),
            };
            session.record_error(entry.clone());
            batch_errors.push(entry);
        }

        Ok(BatchProcessResult {
            session_id: session_id.to_string(),
            batch_number,
            successful: report.successful,
            failed: report.failed,
            errors: batch_errors,
            session_status: session.status,
            total_processed: session.processed_documents,
            total_failed: session.failed_documents,
            progress: session.progress(),
        })
    }

    /// Complete a session: refresh, verify, validate, and hand off to the
    /// deployment coordinator.
    ///
    /// Under `Safe` the alias is left untouched and the returned state is
    /// `READY_FOR_SWAP`; under `AutoSwap` the alias is rebound and the state
    /// is `COMPLETED`. Completion is atomic: any failure after the refresh
    /// marks the session failed.
    #[instrument(skip(self))]
    pub async fn complete(&self, session_id: &str) -> Result<DeploymentState, SessionError> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;

        if session.status != SessionStatus::Active {
            return Err(SessionError::conflict(format!(
                "session {} is {:?}, not active",
                session_id, session.status
            )));
        }

        self.gateway.refresh_index(&session.target_index).await?;

        // Everything past the refresh is atomic: any failure marks the
        // session failed.
        let completion = async {
            let actual_count = self.gateway.count(&session.target_index).await?;
            if actual_count != session.processed_documents {
                // Sources can under- or over-report; trusting the index count
                // avoids waiting forever on a number that will never be
                // reached.
                warn!(
                    session_id = %session_id,
                    index = %session.target_index,
                    processed = session.processed_documents,
                    actual = actual_count,
                    "document count mismatch at completion, using index count"
                );
            }
            self.finish_ingest(&session, actual_count).await
        }
        .await;
        match completion {
            Ok(state) => {
                session.status = SessionStatus::Completed;
                info!(
                    session_id = %session_id,
                    index = %session.target_index,
                    status = ?state.status,
                    "Session completed"
                );
                Ok(state)
            }
            Err(e) => {
                session.status = SessionStatus::Failed;
                session.record_error(SessionErrorEntry {
                    batch_number: None,
                    phase: Some("completion".to_string()),
                    document_ref: None,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Readiness wait, validation, and the optional auto-swap.
    async fn finish_ingest(
        &self,
        session: &IngestSession,
        actual_count: u64,
    ) -> Result<DeploymentState, SessionError> {
        self.probe
            .wait_ready(
                &session.target_index,
                WaitReadyOptions::post_ingest(actual_count),
            )
            .await?;

        if !self.probe.validate(&session.target_index).await? {
            return Err(DeployError::ValidationFailed(session.target_index.clone()).into());
        }

        let current = self.coordinator.get_status(&session.alias).await?;

        if session.strategy == DeploymentStrategy::AutoSwap {
            self.coordinator
                .swap_alias(&session.alias, session.target_color)
                .await?;
            return Ok(DeploymentState {
                alias: session.alias.clone(),
                active_color: Some(session.target_color),
                active_index: Some(session.target_index.clone()),
                staging_color: None,
                staging_index: None,
                status: DeploymentStatus::Completed,
                last_deployment: Some(Utc::now()),
                strategy: session.strategy,
                error: None,
            });
        }

        Ok(DeploymentState {
            alias: session.alias.clone(),
            active_color: current.active_color,
            active_index: current.active_index,
            staging_color: Some(session.target_color),
            staging_index: Some(session.target_index.clone()),
            status: DeploymentStatus::ReadyForSwap,
            last_deployment: Some(Utc::now()),
            strategy: session.strategy,
            error: None,
        })
    }

    /// Cancel a session, deleting its staging index. The alias is untouched.
    pub async fn cancel(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;

        if session.status != SessionStatus::Active {
            return Err(SessionError::conflict(format!(
                "session {} is {:?}, not active",
                session_id, session.status
            )));
        }

        // Absent index is fine; the create may have been rolled back by hand.
        self.lifecycle.delete(&session.target_index).await?;
        session.status = SessionStatus::Failed;

        info!(
            session_id = %session_id,
            index = %session.target_index,
            "Cancelled ingest session"
        );
        Ok(())
    }

    /// A snapshot of one session.
    pub async fn get_session(&self, session_id: &str) -> Option<IngestSession> {
        let handle = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).cloned()
        };
        match handle {
            Some(handle) => Some(handle.lock().await.clone()),
            None => None,
        }
    }

    /// Snapshots of all sessions still accepting batches.
    pub async fn list_active(&self) -> Vec<IngestSession> {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.lock().await;
            sessions.values().cloned().collect()
        };
        let mut active = Vec::new();
        for handle in handles {
            let session = handle.lock().await;
            if session.status == SessionStatus::Active {
                active.push(session.clone());
            }
        }
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        active
    }

    /// Expire and remove idle sessions.
    ///
    /// A non-terminal session whose last batch is older than the configured
    /// timeout is marked expired and dropped from the map. Its staging index
    /// is retained; it may still be promoted by hand.
    pub async fn sweep_expired(&self) -> Vec<String> {
        let handles: Vec<(String, SessionHandle)> = {
            let sessions = self.sessions.lock().await;
            sessions
                .iter()
                .map(|(id, handle)| (id.clone(), handle.clone()))
                .collect()
        };

        let timeout = chrono::Duration::from_std(self.config.session_timeout)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let now = Utc::now();
        let mut expired = Vec::new();
        for (id, handle) in handles {
            let mut session = handle.lock().await;
            if !session.status.is_terminal() && now - session.last_batch_at > timeout {
                session.status = SessionStatus::Expired;
                warn!(
                    session_id = %id,
                    alias = %session.alias,
                    target_index = %session.target_index,
                    "session expired after idle timeout, staging index retained"
                );
                expired.push(id);
            }
        }

        if !expired.is_empty() {
            let mut sessions = self.sessions.lock().await;
            for id in &expired {
                sessions.remove(id);
            }
        }
        expired
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        if session_id.is_empty() {
            return Err(SessionError::invalid_argument("session id must not be empty"));
        }
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::not_found(session_id))
    }
}

/// Spawn the cooperative background task that expires idle sessions.
///
/// Runs on the configured interval until a shutdown signal arrives.
pub fn spawn_expiry_sweeper(
    manager: Arc<SessionManager>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(manager.config().sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let expired = manager.sweep_expired().await;
                    if !expired.is_empty() {
                        info!(count = expired.len(), "removed expired sessions");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("expiry sweeper shutting down");
                    break;
                }
            }
        }
    })
}

/// Generate a session id: `batch_{epochMs}_{random9}`.
fn generate_session_id() -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("batch_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_reindexer_repository::testing::MockClusterGateway;
    use search_reindexer_repository::ProductMapping;
    use serde_json::json;
    use std::time::Duration;

    use search_reindexer_deploy::AliasRegistry;

    fn manager_with(gateway: Arc<MockClusterGateway>, config: SessionConfig) -> SessionManager {
        let mapping = Arc::new(ProductMapping::default());
        let registry = Arc::new(AliasRegistry::new(gateway.clone()));
        let lifecycle = Arc::new(IndexLifecycle::new(gateway.clone(), mapping));
        let probe = Arc::new(HealthProbe::new(gateway.clone()));
        let coordinator = Arc::new(DeploymentCoordinator::new(
            gateway.clone(),
            registry,
            lifecycle.clone(),
            probe.clone(),
        ));
        SessionManager::with_config(gateway, coordinator, lifecycle, probe, config)
    }

    fn manager(gateway: Arc<MockClusterGateway>) -> SessionManager {
        manager_with(gateway, SessionConfig::default())
    }

    fn docs(ids: &[&str]) -> Vec<Value> {
        ids.iter()
            .map(|id| json!({"id": id, "ProductName": format!("Product {}", id)}))
            .collect()
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let mut parts = id.splitn(3, '_');
        assert_eq!(parts.next(), Some("batch"));
        let epoch = parts.next().unwrap();
        assert!(epoch.bytes().all(|b| b.is_ascii_digit()));
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_start_creates_blue_staging_index() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());

        let session = manager
            .start("products-test", DeploymentStrategy::Safe, Some(100))
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.target_color, search_reindexer_deploy::DeployColor::Blue);
        assert!(session.target_index.starts_with("products-test_blue_"));
        assert!(gateway.index_exists(&session.target_index).await.unwrap());
        assert_eq!(session.estimated_total, Some(100));
    }

    #[tokio::test]
    async fn test_process_batch_updates_counters() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, Some(6))
            .await
            .unwrap();

        let result = manager
            .process_batch(&session.session_id, docs(&["A", "B", "C"]))
            .await
            .unwrap();
        assert_eq!(result.batch_number, 1);
        assert_eq!(result.successful, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(result.total_processed, 3);
        assert_eq!(result.progress, Some(50.0));

        let result = manager
            .process_batch(&session.session_id, docs(&["D", "E", "F"]))
            .await
            .unwrap();
        assert_eq!(result.batch_number, 2);
        assert_eq!(result.total_processed, 6);
        assert_eq!(result.progress, Some(100.0));

        assert_eq!(gateway.doc_count(&session.target_index), 6);
    }

    #[tokio::test]
    async fn test_duplicate_ids_reject_whole_batch() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        let err = manager
            .process_batch(&session.session_id, docs(&["X", "Y", "X"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));

        // No cluster writes, counters unchanged.
        assert_eq!(gateway.doc_count(&session.target_index), 0);
        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.total_batches, 0);
        assert_eq!(snapshot.total_documents, 0);
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        let exactly_limit: Vec<Value> =
            (0..1000).map(|i| json!({"recordId": i})).collect();
        let result = manager
            .process_batch(&session.session_id, exactly_limit)
            .await
            .unwrap();
        assert_eq!(result.successful, 1000);

        let over_limit: Vec<Value> = (0..1001).map(|i| json!({"recordId": i})).collect();
        let err = manager
            .process_batch(&session.session_id, over_limit)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway);
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        let err = manager
            .process_batch(&session.session_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_synthetic_ids_for_anonymous_documents() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        let result = manager
            .process_batch(
                &session.session_id,
                vec![json!({"ProductName": "anonymous"}), json!({"recordId": 42})],
            )
            .await
            .unwrap();
        assert_eq!(result.successful, 2);
        assert!(gateway
            .stored_document(&session.target_index, "42")
            .is_some());
    }

    #[tokio::test]
    async fn test_partial_failures_recorded_not_raised() {
        let gateway = Arc::new(MockClusterGateway::new());
        gateway.fail_document("B");
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        let result = manager
            .process_batch(&session.session_id, docs(&["A", "B", "C"]))
            .await
            .unwrap();
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].document_ref.as_deref(), Some("B"));
        assert_eq!(result.session_status, SessionStatus::Active);

        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.failed_documents, 1);
        assert_eq!(snapshot.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_session_active() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        gateway.fail_next_bulk();
        let err = manager
            .process_batch(&session.session_id, docs(&["A"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Cluster(_)));

        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Active);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].batch_number, Some(1));

        // The next batch is accepted.
        let result = manager
            .process_batch(&session.session_id, docs(&["A"]))
            .await
            .unwrap();
        assert_eq!(result.successful, 1);
        assert_eq!(result.batch_number, 2);
    }

    #[tokio::test]
    async fn test_complete_safe_leaves_alias_unbound() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        manager
            .process_batch(&session.session_id, docs(&["A", "B", "C"]))
            .await
            .unwrap();

        let state = manager.complete(&session.session_id).await.unwrap();
        assert_eq!(state.status, DeploymentStatus::ReadyForSwap);
        assert_eq!(state.staging_index.as_deref(), Some(session.target_index.as_str()));
        assert!(state.active_index.is_none());
        assert!(!gateway.alias_exists("products-test").await.unwrap());

        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_auto_swap_binds_alias() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::AutoSwap, None)
            .await
            .unwrap();
        manager
            .process_batch(&session.session_id, docs(&["A", "B", "C"]))
            .await
            .unwrap();

        let state = manager.complete(&session.session_id).await.unwrap();
        assert_eq!(state.status, DeploymentStatus::Completed);
        assert_eq!(state.active_index.as_deref(), Some(session.target_index.as_str()));
        assert_eq!(
            gateway.alias_indices("products-test").await.unwrap(),
            vec![session.target_index.clone()]
        );
    }

    #[tokio::test]
    async fn test_terminal_sessions_reject_operations() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        manager
            .process_batch(&session.session_id, docs(&["A"]))
            .await
            .unwrap();
        manager.complete(&session.session_id).await.unwrap();

        let err = manager
            .process_batch(&session.session_id, docs(&["B"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Conflict(_)));
        let err = manager.complete(&session.session_id).await.unwrap_err();
        assert!(matches!(err, SessionError::Conflict(_)));

        // Counters frozen after the terminal transition.
        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.total_batches, 1);
        assert_eq!(snapshot.processed_documents, 1);
    }

    #[tokio::test]
    async fn test_cancel_deletes_target_index() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        assert!(gateway.index_exists(&session.target_index).await.unwrap());

        manager.cancel(&session.session_id).await.unwrap();
        assert!(!gateway.index_exists(&session.target_index).await.unwrap());
        assert!(!gateway.alias_exists("products-test").await.unwrap());

        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway);

        let err = manager
            .process_batch("batch_0_missing00", docs(&["A"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert!(manager.get_session("batch_0_missing00").await.is_none());
    }

    #[tokio::test]
    async fn test_expiry_sweep_removes_idle_sessions_keeps_index() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager_with(
            gateway.clone(),
            SessionConfig {
                session_timeout: Duration::from_millis(0),
                ..SessionConfig::default()
            },
        );
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        manager
            .process_batch(&session.session_id, docs(&["A"]))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let expired = manager.sweep_expired().await;
        assert_eq!(expired, vec![session.session_id.clone()]);

        // Removed: subsequent operations see NotFound. The staging index
        // survives for manual promotion.
        let err = manager
            .process_batch(&session.session_id, docs(&["B"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert!(gateway.index_exists(&session.target_index).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_spares_recent_and_terminal_sessions() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());
        let session = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        assert!(manager.sweep_expired().await.is_empty());
        let snapshot = manager.get_session(&session.session_id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_list_active_excludes_terminal() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway);
        let first = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        let second = manager
            .start("catalog-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();

        manager.cancel(&first.session_id).await.unwrap();

        let active = manager.list_active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_second_session_targets_green_after_active_blue() {
        let gateway = Arc::new(MockClusterGateway::new());
        let manager = manager(gateway.clone());

        let first = manager
            .start("products-test", DeploymentStrategy::AutoSwap, None)
            .await
            .unwrap();
        manager
            .process_batch(&first.session_id, docs(&["A"]))
            .await
            .unwrap();
        manager.complete(&first.session_id).await.unwrap();

        let second = manager
            .start("products-test", DeploymentStrategy::Safe, None)
            .await
            .unwrap();
        assert_eq!(
            second.target_color,
            search_reindexer_deploy::DeployColor::Green
        );
        assert!(second.target_index.starts_with("products-test_green_"));
    }
}
