//! Shared application state for request handlers.

use std::sync::Arc;

use search_reindexer_deploy::{AliasRegistry, DeploymentCoordinator};
use search_reindexer_repository::ClusterGateway;
use search_reindexer_session::SessionManager;

/// The alias queried when a search request names none.
pub const DEFAULT_ALIAS: &str = "products";

/// Application state shared across handlers.
pub struct ApiState {
    pub gateway: Arc<dyn ClusterGateway>,
    pub registry: Arc<AliasRegistry>,
    pub coordinator: Arc<DeploymentCoordinator>,
    pub sessions: Arc<SessionManager>,
    pub default_alias: String,
}

impl ApiState {
    pub fn new(
        gateway: Arc<dyn ClusterGateway>,
        registry: Arc<AliasRegistry>,
        coordinator: Arc<DeploymentCoordinator>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            gateway,
            registry,
            coordinator,
            sessions,
            default_alias: DEFAULT_ALIAS.to_string(),
        }
    }

    /// Override the default search alias.
    pub fn with_default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = alias.into();
        self
    }
}
