//! Alias registry: CRUD over alias-to-index bindings.
//!
//! Alias membership is only ever changed here, through one atomic alias
//! update, so a failed update leaves the prior binding intact.

use std::sync::Arc;

use tracing::{info, warn};

use search_reindexer_repository::{AliasAction, ClusterError, ClusterGateway};

/// Registry of alias-to-index bindings.
pub struct AliasRegistry {
    gateway: Arc<dyn ClusterGateway>,
}

impl AliasRegistry {
    pub fn new(gateway: Arc<dyn ClusterGateway>) -> Self {
        Self { gateway }
    }

    /// Whether the alias exists.
    pub async fn exists(&self, alias: &str) -> Result<bool, ClusterError> {
        self.gateway.alias_exists(alias).await
    }

    /// Indices currently bound to the alias; empty if the alias is absent.
    pub async fn indices_for(&self, alias: &str) -> Result<Vec<String>, ClusterError> {
        self.gateway.alias_indices(alias).await
    }

    /// Bind an alias to an index with a single add action.
    pub async fn create(&self, alias: &str, index: &str) -> Result<bool, ClusterError> {
        let acknowledged = self
            .gateway
            .update_aliases(&[AliasAction::Add {
                index: index.to_string(),
                alias: alias.to_string(),
            }])
            .await?;
        info!(alias = %alias, index = %index, acknowledged, "Bound alias");
        Ok(acknowledged)
    }

    /// Atomically move the alias onto `new_index`.
    ///
    /// Builds one action list: a remove for every currently bound index other
    /// than `new_index`, followed by the add. The cluster applies the whole
    /// list as one transaction; an add is always present, so the alias can
    /// never be left unbound by this call.
    ///
    /// When `delete_old` is set and the update was acknowledged, the removed
    /// indices are deleted sequentially. A delete failure is logged and
    /// skipped; it never reverts the swap.
    pub async fn swap(
        &self,
        alias: &str,
        new_index: &str,
        delete_old: bool,
    ) -> Result<bool, ClusterError> {
        let current = self.indices_for(alias).await?;

        let removed: Vec<String> = current
            .into_iter()
            .filter(|index| index != new_index)
            .collect();
        let mut actions: Vec<AliasAction> = removed
            .iter()
            .map(|index| AliasAction::Remove {
                index: index.clone(),
                alias: alias.to_string(),
            })
            .collect();
        actions.push(AliasAction::Add {
            index: new_index.to_string(),
            alias: alias.to_string(),
        });

        let acknowledged = self.gateway.update_aliases(&actions).await?;
        info!(
            alias = %alias,
            new_index = %new_index,
            removed = ?removed,
            acknowledged,
            "Swapped alias"
        );

        if delete_old && acknowledged {
            for index in &removed {
                if let Err(e) = self.gateway.delete_index(index).await {
                    warn!(
                        alias = %alias,
                        index = %index,
                        error = %e,
                        "failed to delete retired index"
                    );
                }
            }
        }

        Ok(acknowledged)
    }
}
