//! Index lifecycle: timestamped name generation, creation, deletion.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use search_reindexer_repository::{ClusterGateway, MappingProvider};

use crate::color::DeployColor;
use crate::errors::DeployError;

/// Timestamp format of colored deployment index names, 14 characters.
///
/// String comparison on this format sorts indices in creation order.
pub const COLOR_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timestamp format of colorless base index names, 17 characters
/// (millisecond precision).
pub const BASE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Creates and deletes the physical indices behind an alias.
///
/// The mapping is supplied by the injected provider and is opaque here; to
/// change a mapping a new deployment is run, indices are never mutated in
/// place.
pub struct IndexLifecycle {
    gateway: Arc<dyn ClusterGateway>,
    mapping: Arc<dyn MappingProvider>,
}

impl IndexLifecycle {
    pub fn new(gateway: Arc<dyn ClusterGateway>, mapping: Arc<dyn MappingProvider>) -> Self {
        Self { gateway, mapping }
    }

    /// Generate a timestamped index name for the alias.
    ///
    /// With a color: `{alias}_{color}_{YYYYMMDDHHMMSS}`. Without:
    /// `{alias}_{YYYYMMDDHHMMSSfff}`.
    pub fn generate_name(&self, alias: &str, color: Option<DeployColor>) -> String {
        let now = Utc::now();
        match color {
            Some(color) => format!(
                "{}_{}_{}",
                alias,
                color,
                now.format(COLOR_TIMESTAMP_FORMAT)
            ),
            None => format!("{}_{}", alias, now.format(BASE_TIMESTAMP_FORMAT)),
        }
    }

    /// Parse a colored deployment index name into its color and timestamp.
    ///
    /// Returns `None` unless the name is exactly
    /// `{alias}_(blue|green)_{14 digits}`.
    pub fn parse_deployment_name(alias: &str, name: &str) -> Option<(DeployColor, String)> {
        let rest = name.strip_prefix(alias)?.strip_prefix('_')?;
        let (color, timestamp) = if let Some(ts) = rest.strip_prefix("blue_") {
            (DeployColor::Blue, ts)
        } else if let Some(ts) = rest.strip_prefix("green_") {
            (DeployColor::Green, ts)
        } else {
            return None;
        };
        if timestamp.len() == 14 && timestamp.bytes().all(|b| b.is_ascii_digit()) {
            Some((color, timestamp.to_string()))
        } else {
            None
        }
    }

    /// Recover the creation time embedded in a deployment index name.
    pub fn parse_timestamp(alias: &str, name: &str) -> Option<DateTime<Utc>> {
        let (_, timestamp) = Self::parse_deployment_name(alias, name)?;
        NaiveDateTime::parse_from_str(&timestamp, COLOR_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Whether a name uses the retired dash-separated scheme for this alias.
    pub fn is_legacy_name(alias: &str, name: &str) -> bool {
        match name.strip_prefix(alias) {
            Some(rest) => rest.starts_with("-blue-") || rest.starts_with("-green-"),
            None => false,
        }
    }

    /// Find legacy dash-separated indices for an alias.
    ///
    /// These are rejected rather than silently supported; the structured
    /// warning gives operators the list to migrate.
    pub async fn find_legacy(&self, alias: &str) -> Result<Vec<String>, DeployError> {
        let matches = self.gateway.indices_matching(&format!("{}-*", alias)).await?;
        let legacy: Vec<String> = matches
            .into_iter()
            .filter(|name| Self::is_legacy_name(alias, name))
            .collect();
        if !legacy.is_empty() {
            warn!(
                alias = %alias,
                indices = ?legacy,
                "legacy dash-separated index names present, migrate before deploying"
            );
        }
        Ok(legacy)
    }

    /// Create an index with the configured mapping.
    ///
    /// Fails if the index already exists. If `alias` is given it is bound in
    /// the same call.
    pub async fn create(&self, name: &str, alias: Option<&str>) -> Result<(), DeployError> {
        if self.gateway.index_exists(name).await? {
            return Err(DeployError::IndexExists(name.to_string()));
        }
        let body = self.mapping.index_body();
        self.gateway.create_index(name, &body, alias).await?;
        info!(index = %name, "Created mapped index");
        Ok(())
    }

    /// Delete an index. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> Result<bool, DeployError> {
        Ok(self.gateway.delete_index(name).await?)
    }

    /// Whether the index exists.
    pub async fn exists(&self, name: &str) -> Result<bool, DeployError> {
        Ok(self.gateway.index_exists(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_reindexer_repository::testing::MockClusterGateway;
    use search_reindexer_repository::ProductMapping;
    use serde_json::json;

    fn lifecycle(gateway: Arc<MockClusterGateway>) -> IndexLifecycle {
        IndexLifecycle::new(gateway, Arc::new(ProductMapping::default()))
    }

    #[test]
    fn test_generate_name_shapes() {
        let gateway = Arc::new(MockClusterGateway::new());
        let lifecycle = lifecycle(gateway);

        let colored = lifecycle.generate_name("products", Some(DeployColor::Blue));
        let (color, ts) =
            IndexLifecycle::parse_deployment_name("products", &colored).expect("parseable");
        assert_eq!(color, DeployColor::Blue);
        assert_eq!(ts.len(), 14);

        let base = lifecycle.generate_name("products", None);
        let suffix = base.strip_prefix("products_").unwrap();
        assert_eq!(suffix.len(), 17);
        assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_parse_deployment_name_rejects_malformed() {
        assert!(IndexLifecycle::parse_deployment_name(
            "products",
            "products_blue_20250101120000"
        )
        .is_some());
        // Wrong alias
        assert!(
            IndexLifecycle::parse_deployment_name("catalog", "products_blue_20250101120000")
                .is_none()
        );
        // Colorless base form
        assert!(IndexLifecycle::parse_deployment_name(
            "products",
            "products_20250101120000123"
        )
        .is_none());
        // Truncated timestamp
        assert!(
            IndexLifecycle::parse_deployment_name("products", "products_blue_2025").is_none()
        );
    }

    #[test]
    fn test_parse_timestamp_round_trip() {
        let ts = IndexLifecycle::parse_timestamp("products", "products_green_20250615093045")
            .expect("valid timestamp");
        assert_eq!(ts.to_rfc3339(), "2025-06-15T09:30:45+00:00");
    }

    #[test]
    fn test_is_legacy_name() {
        assert!(IndexLifecycle::is_legacy_name(
            "products",
            "products-blue-2025-01-01T12:00:00"
        ));
        assert!(!IndexLifecycle::is_legacy_name(
            "products",
            "products_blue_20250101120000"
        ));
        assert!(!IndexLifecycle::is_legacy_name(
            "products",
            "products-archive"
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_existing() {
        let gateway = Arc::new(MockClusterGateway::new());
        gateway
            .create_index("products_blue_20250101120000", &json!({}), None)
            .await
            .unwrap();

        let lifecycle = lifecycle(gateway);
        let err = lifecycle
            .create("products_blue_20250101120000", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::IndexExists(_)));
    }

    #[tokio::test]
    async fn test_create_binds_alias_in_same_call() {
        let gateway = Arc::new(MockClusterGateway::new());
        let lifecycle = lifecycle(gateway.clone());

        lifecycle
            .create("products_blue_20250101120000", Some("products"))
            .await
            .unwrap();

        assert_eq!(
            gateway.alias_indices("products").await.unwrap(),
            vec!["products_blue_20250101120000".to_string()]
        );
    }

    #[tokio::test]
    async fn test_find_legacy() {
        let gateway = Arc::new(MockClusterGateway::new());
        gateway
            .create_index("products-blue-2025-01-01", &json!({}), None)
            .await
            .unwrap();
        gateway
            .create_index("products_blue_20250101120000", &json!({}), None)
            .await
            .unwrap();

        let lifecycle = lifecycle(gateway);
        let legacy = lifecycle.find_legacy("products").await.unwrap();
        assert_eq!(legacy, vec!["products-blue-2025-01-01".to_string()]);
    }
}
