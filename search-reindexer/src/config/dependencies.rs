//! Dependency initialization and wiring for the reindexer service.

use std::env;
use std::sync::Arc;

use tracing::info;

use crate::ServiceError;
use search_reindexer_api::ApiState;
use search_reindexer_deploy::{
    AliasRegistry, DeploymentCoordinator, HealthProbe, IndexLifecycle,
};
use search_reindexer_repository::{
    ClusterGateway, ElasticsearchGateway, HealthRequest, ProductMapping,
};
use search_reindexer_session::SessionManager;

/// Default cluster URL.
const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// Default HTTP port.
const DEFAULT_PORT: u16 = 3000;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Shared handler state, ready for the router.
    pub state: Arc<ApiState>,
    /// Session manager, for the expiry sweeper.
    pub sessions: Arc<SessionManager>,
    /// HTTP port to bind.
    pub port: u16,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTICSEARCH_URL`: cluster URL (default: http://localhost:9200)
    /// - `ELASTICSEARCH_API_KEY`: base64-encoded API key (optional)
    /// - `PORT`: HTTP port (default: 3000)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If initialization fails
    pub async fn new() -> Result<Self, ServiceError> {
        let elasticsearch_url = env::var("ELASTICSEARCH_URL")
            .unwrap_or_else(|_| DEFAULT_ELASTICSEARCH_URL.to_string());
        let api_key = env::var("ELASTICSEARCH_API_KEY").ok();
        let port: u16 = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ServiceError::config(format!("invalid PORT: {}", raw)))?,
            Err(_) => DEFAULT_PORT,
        };

        info!(
            elasticsearch_url = %elasticsearch_url,
            authenticated = api_key.is_some(),
            port = port,
            "Initializing dependencies"
        );

        let gateway: Arc<dyn ClusterGateway> = Arc::new(
            ElasticsearchGateway::new(&elasticsearch_url, api_key.as_deref())
                .map_err(|e| ServiceError::config(format!("Failed to create gateway: {}", e)))?,
        );

        // Verify the cluster is reachable before serving traffic.
        let health = gateway
            .cluster_health(HealthRequest::cluster())
            .await
            .map_err(|e| ServiceError::config(format!("Cluster health check failed: {}", e)))?;
        info!(
            cluster = %health.cluster_name,
            status = %health.status,
            "Cluster connection verified"
        );

        let mapping = Arc::new(ProductMapping::default());
        let registry = Arc::new(AliasRegistry::new(gateway.clone()));
        let lifecycle = Arc::new(IndexLifecycle::new(gateway.clone(), mapping));
        let probe = Arc::new(HealthProbe::new(gateway.clone()));
        let coordinator = Arc::new(DeploymentCoordinator::new(
            gateway.clone(),
            registry.clone(),
            lifecycle.clone(),
            probe.clone(),
        ));
        let sessions = Arc::new(SessionManager::new(
            gateway.clone(),
            coordinator.clone(),
            lifecycle,
            probe,
        ));

        let state = Arc::new(ApiState::new(
            gateway,
            registry,
            coordinator,
            sessions.clone(),
        ));

        Ok(Self {
            state,
            sessions,
            port,
        })
    }
}
