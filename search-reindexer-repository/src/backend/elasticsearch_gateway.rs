//! Elasticsearch gateway implementation.
//!
//! This module provides the concrete implementation of `ClusterGateway`
//! using the official Elasticsearch Rust client.

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsAliasParts, IndicesExistsParts,
    IndicesGetAliasParts, IndicesGetMappingParts, IndicesGetParts, IndicesRefreshParts,
    IndicesStatsParts,
};
use elasticsearch::params::{Refresh, WaitForStatus};
use elasticsearch::{BulkParts, CountParts, Elasticsearch, GetParts, SearchParts};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::ClusterError;
use crate::interfaces::ClusterGateway;
use crate::types::{
    AliasAction, BulkItemError, BulkItemOutcome, BulkOperation, BulkResponse, ClusterHealth,
    HealthRequest, HealthStatus, IndexStats,
};

/// Elasticsearch gateway.
///
/// Thin typed wrapper over the cluster's bulk, alias, index, health, count,
/// and refresh primitives. Carries no policy: every decision about what to
/// create, swap, or delete lives in the layers above.
pub struct ElasticsearchGateway {
    client: Elasticsearch,
}

impl ElasticsearchGateway {
    /// Create a new gateway connected to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The cluster URL (e.g. "http://localhost:9200")
    /// * `api_key` - Optional base64-encoded API key for authentication
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, ClusterError> {
        let parsed_url = Url::parse(url).map_err(|e| ClusterError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(key) = api_key {
            builder = builder.auth(Credentials::EncodedApiKey(key.to_string()));
        }
        let transport = builder
            .build()
            .map_err(|e| ClusterError::connection(e.to_string()))?;

        info!(url = %url, "Created Elasticsearch gateway");

        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }

    /// Read a response body as JSON, mapping failures to `ResponseError`.
    async fn read_json(
        response: elasticsearch::http::response::Response,
    ) -> Result<Value, ClusterError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| ClusterError::response(e.to_string()))
    }

    /// Fail on a non-success status, logging the response body.
    async fn ensure_success(
        response: elasticsearch::http::response::Response,
        context: &str,
    ) -> Result<Value, ClusterError> {
        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "{} failed", context);
            return Err(ClusterError::unexpected(status.as_u16(), body));
        }
        Self::read_json(response).await
    }

    /// Parse one bulk response item into an outcome.
    fn parse_bulk_item(item: &Value) -> BulkItemOutcome {
        // Each item is an object with a single key naming the operation.
        let (operation, detail) = item
            .as_object()
            .and_then(|o| o.iter().next())
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap_or_else(|| ("unknown".to_string(), json!({})));

        let status = detail
            .get("status")
            .and_then(|s| s.as_u64())
            .unwrap_or(0) as u16;
        let id = detail
            .get("_id")
            .and_then(|i| i.as_str())
            .unwrap_or_default()
            .to_string();
        let error = detail.get("error").map(|e| BulkItemError {
            error_type: e
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("unknown")
                .to_string(),
            reason: e
                .get("reason")
                .and_then(|r| r.as_str())
                .unwrap_or_default()
                .to_string(),
        });

        BulkItemOutcome {
            operation,
            id,
            status,
            error,
        }
    }
}

#[async_trait]
impl ClusterGateway for ElasticsearchGateway {
    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        refresh: bool,
    ) -> Result<BulkResponse, ClusterError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for op in &operations {
            body.push(op.header().into());
            if let BulkOperation::Index { document, .. } = op {
                body.push(document.clone().into());
            }
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .refresh(if refresh { Refresh::True } else { Refresh::False })
            .body(body)
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        let body = Self::ensure_success(response, "Bulk request").await?;

        let any_errors = body
            .get("errors")
            .and_then(|e| e.as_bool())
            .unwrap_or(false);
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .map(|items| items.iter().map(Self::parse_bulk_item).collect())
            .unwrap_or_default();

        debug!(
            items = operations.len(),
            any_errors = any_errors,
            "Bulk request completed"
        );

        Ok(BulkResponse { any_errors, items })
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<bool, ClusterError> {
        let action_values: Vec<Value> = actions.iter().map(AliasAction::to_value).collect();

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": action_values }))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        let body = Self::ensure_success(response, "Alias update").await?;
        let acknowledged = body
            .get("acknowledged")
            .and_then(|a| a.as_bool())
            .unwrap_or(false);

        debug!(actions = actions.len(), acknowledged, "Alias update applied");
        Ok(acknowledged)
    }

    async fn alias_indices(&self, alias: &str) -> Result<Vec<String>, ClusterError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        // An absent alias is a 404 and an empty set, not an error.
        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }

        let body = Self::ensure_success(response, "Alias lookup").await?;
        let mut indices: Vec<String> = body
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        indices.sort();
        Ok(indices)
    }

    async fn alias_exists(&self, alias: &str) -> Result<bool, ClusterError> {
        let response = self
            .client
            .indices()
            .exists_alias(IndicesExistsAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn create_index(
        &self,
        name: &str,
        body: &Value,
        alias: Option<&str>,
    ) -> Result<bool, ClusterError> {
        let mut create_body = body.clone();
        if let Some(alias) = alias {
            // Bind the alias in the same call so the index is never visible
            // to consumers without it.
            create_body["aliases"] = json!({ alias: {} });
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(create_body)
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        let body = Self::ensure_success(response, "Index create").await?;
        let acknowledged = body
            .get("acknowledged")
            .and_then(|a| a.as_bool())
            .unwrap_or(false);

        info!(index = %name, alias = ?alias, acknowledged, "Created index");
        Ok(acknowledged)
    }

    async fn delete_index(&self, name: &str) -> Result<bool, ClusterError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            debug!(index = %name, "Delete skipped, index absent");
            return Ok(false);
        }

        let body = Self::ensure_success(response, "Index delete").await?;
        let acknowledged = body
            .get("acknowledged")
            .and_then(|a| a.as_bool())
            .unwrap_or(false);

        info!(index = %name, acknowledged, "Deleted index");
        Ok(acknowledged)
    }

    async fn index_exists(&self, name: &str) -> Result<bool, ClusterError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn indices_matching(&self, pattern: &str) -> Result<Vec<String>, ClusterError> {
        let response = self
            .client
            .indices()
            .get(IndicesGetParts::Index(&[pattern]))
            .ignore_unavailable(true)
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }

        let body = Self::ensure_success(response, "Index pattern lookup").await?;
        let mut names: Vec<String> = body
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn refresh_index(&self, name: &str) -> Result<(), ClusterError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        Self::ensure_success(response, "Index refresh").await?;
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64, ClusterError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        let body = Self::ensure_success(response, "Count").await?;
        body.get("count")
            .and_then(|c| c.as_u64())
            .ok_or_else(|| ClusterError::response("count response missing count field"))
    }

    async fn cluster_health(&self, request: HealthRequest) -> Result<ClusterHealth, ClusterError> {
        let indices: Vec<&str>;
        let parts = match request.index.as_deref() {
            Some(index) => {
                indices = vec![index];
                ClusterHealthParts::Index(&indices)
            }
            None => ClusterHealthParts::None,
        };

        let cluster = self.client.cluster();
        let mut health = cluster.health(parts);
        if let Some(status) = request.wait_for_status {
            health = health.wait_for_status(match status {
                HealthStatus::Green => WaitForStatus::Green,
                HealthStatus::Yellow => WaitForStatus::Yellow,
                HealthStatus::Red => WaitForStatus::Red,
            });
        }
        let timeout;
        if let Some(t) = request.timeout {
            timeout = format!("{}s", t.as_secs().max(1));
            health = health.timeout(&timeout);
        }

        let response = health
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        // A health wait that times out returns 408 with a regular body.
        let status_code = response.status_code();
        let body = if status_code.is_success() || status_code.as_u16() == 408 {
            Self::read_json(response).await?
        } else {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status_code, body = %text, "Cluster health failed");
            return Err(ClusterError::unexpected(status_code.as_u16(), text));
        };

        let status = body
            .get("status")
            .and_then(|s| s.as_str())
            .and_then(HealthStatus::parse)
            .ok_or_else(|| ClusterError::response("health response missing status"))?;

        Ok(ClusterHealth {
            status,
            cluster_name: body
                .get("cluster_name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string(),
            number_of_nodes: body
                .get("number_of_nodes")
                .and_then(|n| n.as_u64())
                .unwrap_or(0),
            timed_out: body
                .get("timed_out")
                .and_then(|t| t.as_bool())
                .unwrap_or(false),
        })
    }

    async fn index_stats(&self, name: &str) -> Result<IndexStats, ClusterError> {
        let response = self
            .client
            .indices()
            .stats(IndicesStatsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        let body = Self::ensure_success(response, "Index stats").await?;

        // Navigate to indices.{name}.total
        let total = body
            .get("indices")
            .and_then(|indices| indices.get(name))
            .and_then(|idx| idx.get("total"));

        Ok(IndexStats {
            doc_count: total
                .and_then(|t| t.get("docs"))
                .and_then(|d| d.get("count"))
                .and_then(|c| c.as_u64())
                .unwrap_or(0),
            store_size_bytes: total
                .and_then(|t| t.get("store"))
                .and_then(|s| s.get("size_in_bytes"))
                .and_then(|s| s.as_u64())
                .unwrap_or(0),
            indexing_rate: total
                .and_then(|t| t.get("indexing"))
                .and_then(|i| i.get("index_total"))
                .and_then(|i| i.as_u64())
                .unwrap_or(0),
            search_rate: total
                .and_then(|t| t.get("search"))
                .and_then(|s| s.get("query_total"))
                .and_then(|q| q.as_u64())
                .unwrap_or(0),
        })
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, ClusterError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }

        let body = Self::ensure_success(response, "Document get").await?;
        if body.get("found").and_then(|f| f.as_bool()) == Some(true) {
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }

    async fn search(&self, index: &str, body: Value) -> Result<Value, ClusterError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        Self::ensure_success(response, "Search").await
    }

    async fn get_mappings(&self, pattern: &str) -> Result<Value, ClusterError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[pattern]))
            .send()
            .await
            .map_err(|e| ClusterError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(json!({}));
        }

        Self::ensure_success(response, "Mapping lookup").await
    }
}
