//! Deployment coordinator: the per-alias blue/green state machine.
//!
//! Sequences deploy, swap, rollback, and cleanup. State is derived from the
//! cluster on every call (alias bindings plus the `{alias}_*` index pattern);
//! nothing is persisted in the control plane.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use search_reindexer_repository::ClusterGateway;

use crate::aliases::AliasRegistry;
use crate::bulk::{bulk_index_chunked, extract_doc_id, DEFAULT_CHUNK_SIZE};
use crate::color::DeployColor;
use crate::errors::DeployError;
use crate::health::{HealthProbe, WaitReadyOptions};
use crate::lifecycle::IndexLifecycle;
use crate::state::{DeploymentState, DeploymentStatus, DeploymentStrategy};

/// Coordinates blue/green deployments for aliases.
pub struct DeploymentCoordinator {
    gateway: Arc<dyn ClusterGateway>,
    registry: Arc<AliasRegistry>,
    lifecycle: Arc<IndexLifecycle>,
    probe: Arc<HealthProbe>,
    chunk_size: usize,
}

impl DeploymentCoordinator {
    pub fn new(
        gateway: Arc<dyn ClusterGateway>,
        registry: Arc<AliasRegistry>,
        lifecycle: Arc<IndexLifecycle>,
        probe: Arc<HealthProbe>,
    ) -> Self {
        Self {
            gateway,
            registry,
            lifecycle,
            probe,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the bulk chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Derive the blue/green state of an alias from the cluster.
    ///
    /// The staging index is the most recent deployment index (greatest name,
    /// which equals the newest timestamp) that is not active and whose color
    /// differs from the active color.
    pub async fn get_status(&self, alias: &str) -> Result<DeploymentState, DeployError> {
        DeployError::check_alias(alias)?;

        let legacy = self.lifecycle.find_legacy(alias).await?;
        if !legacy.is_empty() {
            return Err(DeployError::LegacyIndexName(legacy.join(", ")));
        }

        let bound = self.registry.indices_for(alias).await?;
        // Invariant: at most one index outside an in-flight swap. If the
        // cluster reports more, the greatest name wins.
        let active_index = bound.into_iter().max();
        let active_color = active_index
            .as_deref()
            .and_then(DeployColor::from_index_name);

        let mut deployment_indices: Vec<String> = self
            .gateway
            .indices_matching(&format!("{}_*", alias))
            .await?
            .into_iter()
            .filter(|name| IndexLifecycle::parse_deployment_name(alias, name).is_some())
            .collect();
        deployment_indices.sort();

        let staging_index = deployment_indices
            .iter()
            .filter(|name| Some(name.as_str()) != active_index.as_deref())
            .filter(|name| match active_color {
                Some(active) => DeployColor::from_index_name(name) != Some(active),
                None => true,
            })
            .max()
            .cloned();
        let staging_color = staging_index
            .as_deref()
            .and_then(DeployColor::from_index_name);

        let status = if staging_index.is_some() {
            DeploymentStatus::ReadyForSwap
        } else if active_index.is_some() {
            DeploymentStatus::Completed
        } else {
            DeploymentStatus::Idle
        };

        let last_deployment = deployment_indices
            .iter()
            .max()
            .and_then(|name| IndexLifecycle::parse_timestamp(alias, name));

        Ok(DeploymentState {
            alias: alias.to_string(),
            active_color,
            active_index,
            staging_color,
            staging_index,
            status,
            last_deployment,
            strategy: DeploymentStrategy::Safe,
            error: None,
        })
    }

    /// Run a full deployment: create the staging index, ingest, validate,
    /// and (under `AutoSwap`) rebind the alias.
    #[instrument(skip(self, documents), fields(alias = %alias, documents = documents.len()))]
    pub async fn deploy(
        &self,
        alias: &str,
        documents: &[Value],
        strategy: DeploymentStrategy,
    ) -> Result<DeploymentState, DeployError> {
        let state = self.get_status(alias).await?;
        let target_color = state.next_color();
        let target_index = self.lifecycle.generate_name(alias, Some(target_color));

        info!(
            alias = %alias,
            target_index = %target_index,
            target_color = %target_color,
            strategy = ?strategy,
            "Starting deployment"
        );

        self.lifecycle.create(&target_index, None).await?;

        let epoch_ms = Utc::now().timestamp_millis();
        let keyed: Vec<(String, Value)> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let id = extract_doc_id(doc)
                    .unwrap_or_else(|| format!("doc_{}_{}_{}", alias, i, epoch_ms));
                (id, doc.clone())
            })
            .collect();

        let report = bulk_index_chunked(
            self.gateway.as_ref(),
            &target_index,
            &keyed,
            self.chunk_size,
        )
        .await?;

        self.probe
            .wait_ready(
                &target_index,
                WaitReadyOptions::post_ingest(documents.len() as u64),
            )
            .await?;

        if !self.probe.validate(&target_index).await? {
            return Err(DeployError::ValidationFailed(target_index));
        }

        let error = if report.failed > 0 {
            Some(format!("{} documents failed to index", report.failed))
        } else {
            None
        };

        if strategy == DeploymentStrategy::AutoSwap {
            self.swap_alias(alias, target_color).await?;
            info!(alias = %alias, index = %target_index, "Deployment completed with auto swap");
            return Ok(DeploymentState {
                alias: alias.to_string(),
                active_color: Some(target_color),
                active_index: Some(target_index),
                staging_color: None,
                staging_index: None,
                status: DeploymentStatus::Completed,
                last_deployment: Some(Utc::now()),
                strategy,
                error,
            });
        }

        info!(alias = %alias, index = %target_index, "Deployment ready for swap");
        Ok(DeploymentState {
            alias: alias.to_string(),
            active_color: state.active_color,
            active_index: state.active_index,
            staging_color: Some(target_color),
            staging_index: Some(target_index),
            status: DeploymentStatus::ReadyForSwap,
            last_deployment: Some(Utc::now()),
            strategy,
            error,
        })
    }

    /// Atomically move the alias onto the staging index of `target_color`.
    pub async fn swap_alias(
        &self,
        alias: &str,
        target_color: DeployColor,
    ) -> Result<String, DeployError> {
        let state = self.get_status(alias).await?;
        let staging_index = state
            .staging_index
            .ok_or_else(|| DeployError::NoStagingIndex(alias.to_string()))?;
        let staging_color = state
            .staging_color
            .ok_or_else(|| DeployError::UnknownColor(staging_index.clone()))?;
        if staging_color != target_color {
            return Err(DeployError::StagingColorMismatch {
                alias: alias.to_string(),
                requested: target_color,
                staging: staging_color,
            });
        }

        let acknowledged = self.registry.swap(alias, &staging_index, false).await?;
        if !acknowledged {
            return Err(DeployError::Cluster(
                search_reindexer_repository::ClusterError::not_acknowledged(format!(
                    "alias swap for {}",
                    alias
                )),
            ));
        }

        info!(alias = %alias, index = %staging_index, color = %target_color, "Alias swapped");
        Ok(staging_index)
    }

    /// Promote an explicit index to active.
    pub async fn promote(&self, alias: &str, target_index: &str) -> Result<(), DeployError> {
        DeployError::check_alias(alias)?;
        if !self.lifecycle.exists(target_index).await? {
            return Err(DeployError::IndexNotFound(target_index.to_string()));
        }
        let acknowledged = self.registry.swap(alias, target_index, false).await?;
        if !acknowledged {
            return Err(DeployError::Cluster(
                search_reindexer_repository::ClusterError::not_acknowledged(format!(
                    "promote for {}",
                    alias
                )),
            ));
        }
        info!(alias = %alias, index = %target_index, "Promoted index");
        Ok(())
    }

    /// Roll the alias back to the most recent index of the previous color.
    pub async fn rollback(&self, alias: &str) -> Result<String, DeployError> {
        let state = self.get_status(alias).await?;
        let active_index = state
            .active_index
            .ok_or_else(|| DeployError::NoActiveIndex(alias.to_string()))?;
        let active_color = state
            .active_color
            .ok_or(DeployError::UnknownColor(active_index))?;
        let previous_color = active_color.opposite();

        let mut candidates: Vec<String> = self
            .gateway
            .indices_matching(&format!("{}_{}_*", alias, previous_color))
            .await?
            .into_iter()
            .filter(|name| IndexLifecycle::parse_deployment_name(alias, name).is_some())
            .collect();
        candidates.sort();
        let previous_index = candidates.pop().ok_or(DeployError::NoPreviousIndex {
            alias: alias.to_string(),
            color: previous_color,
        })?;

        let acknowledged = self.registry.swap(alias, &previous_index, false).await?;
        if !acknowledged {
            return Err(DeployError::Cluster(
                search_reindexer_repository::ClusterError::not_acknowledged(format!(
                    "rollback for {}",
                    alias
                )),
            ));
        }

        info!(
            alias = %alias,
            index = %previous_index,
            color = %previous_color,
            "Rolled back alias"
        );
        Ok(previous_index)
    }

    /// Delete every index of the non-active color, keeping the active index.
    ///
    /// Deletes are best-effort: a failure is logged and skipped.
    pub async fn cleanup(&self, alias: &str) -> Result<Vec<String>, DeployError> {
        let state = self.get_status(alias).await?;
        let active_index = state
            .active_index
            .ok_or_else(|| DeployError::NoActiveIndex(alias.to_string()))?;
        let active_color = state
            .active_color
            .ok_or_else(|| DeployError::UnknownColor(active_index.clone()))?;
        let previous_color = active_color.opposite();

        let candidates = self
            .gateway
            .indices_matching(&format!("{}_{}_*", alias, previous_color))
            .await?;

        let mut deleted = Vec::new();
        for index in candidates {
            if index == active_index {
                continue;
            }
            match self.lifecycle.delete(&index).await {
                Ok(_) => deleted.push(index),
                Err(e) => {
                    warn!(
                        alias = %alias,
                        index = %index,
                        error = %e,
                        "failed to delete retired index"
                    );
                }
            }
        }

        info!(alias = %alias, deleted = deleted.len(), "Cleanup finished");
        Ok(deleted)
    }
}
