//! In-memory cluster gateway for tests.
//!
//! `MockClusterGateway` implements `ClusterGateway` against plain maps so the
//! control plane can be exercised end to end without a cluster. Enabled for
//! this crate's own tests and for downstream crates via the `testsuite`
//! feature.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::ClusterError;
use crate::interfaces::ClusterGateway;
use crate::types::{
    AliasAction, BulkItemError, BulkItemOutcome, BulkOperation, BulkResponse, ClusterHealth,
    HealthRequest, HealthStatus, IndexStats,
};

#[derive(Default)]
struct MockIndex {
    body: Value,
    docs: BTreeMap<String, Value>,
}

#[derive(Default)]
struct MockState {
    indices: BTreeMap<String, MockIndex>,
    aliases: BTreeMap<String, BTreeSet<String>>,
    health: HealthStatus,
    fail_next_bulk: bool,
    failing_doc_ids: BTreeSet<String>,
    refreshed: Vec<String>,
}

/// In-memory stand-in for the search cluster.
///
/// Alias updates are applied atomically under one lock, mirroring the
/// cluster's transactional `aliasesUpdate` contract.
#[derive(Default)]
pub struct MockClusterGateway {
    state: Mutex<MockState>,
}

impl MockClusterGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status reported for every health request.
    pub fn set_health(&self, status: HealthStatus) {
        self.state.lock().unwrap().health = status;
    }

    /// Make the next bulk call fail at the transport layer.
    pub fn fail_next_bulk(&self) {
        self.state.lock().unwrap().fail_next_bulk = true;
    }

    /// Make every bulk item targeting the given document id fail.
    pub fn fail_document(&self, id: impl Into<String>) {
        self.state.lock().unwrap().failing_doc_ids.insert(id.into());
    }

    /// Names of all existing indices.
    pub fn index_names(&self) -> Vec<String> {
        self.state.lock().unwrap().indices.keys().cloned().collect()
    }

    /// Number of documents in an index, or zero if it does not exist.
    pub fn doc_count(&self, index: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .indices
            .get(index)
            .map(|i| i.docs.len())
            .unwrap_or(0)
    }

    /// Fetch a stored document source.
    pub fn stored_document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .indices
            .get(index)
            .and_then(|i| i.docs.get(id).cloned())
    }

    /// Indices an index name or alias resolves to for search.
    fn resolve(state: &MockState, name: &str) -> Option<String> {
        if state.indices.contains_key(name) {
            return Some(name.to_string());
        }
        state
            .aliases
            .get(name)
            .and_then(|set| set.iter().next().cloned())
    }

    fn glob_match(pattern: &str, name: &str) -> bool {
        // Supports '*' wildcards; segments must appear in order.
        let mut rest = name;
        let mut segments = pattern.split('*').peekable();
        let mut first = true;
        while let Some(seg) = segments.next() {
            if seg.is_empty() {
                first = false;
                continue;
            }
            if first {
                if !rest.starts_with(seg) {
                    return false;
                }
                rest = &rest[seg.len()..];
            } else if segments.peek().is_none() && !pattern.ends_with('*') {
                return rest.ends_with(seg);
            } else {
                match rest.find(seg) {
                    Some(pos) => rest = &rest[pos + seg.len()..],
                    None => return false,
                }
            }
            first = false;
        }
        pattern.ends_with('*') || rest.is_empty()
    }
}

#[async_trait]
impl ClusterGateway for MockClusterGateway {
    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        _refresh: bool,
    ) -> Result<BulkResponse, ClusterError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_bulk {
            state.fail_next_bulk = false;
            return Err(ClusterError::request("simulated transport failure"));
        }

        let mut items = Vec::with_capacity(operations.len());
        let mut any_errors = false;
        for op in operations {
            let outcome = match op {
                BulkOperation::Index {
                    index,
                    id,
                    document,
                } => {
                    if state.failing_doc_ids.contains(&id) {
                        any_errors = true;
                        BulkItemOutcome {
                            operation: "index".to_string(),
                            id,
                            status: 400,
                            error: Some(BulkItemError {
                                error_type: "mapper_parsing_exception".to_string(),
                                reason: "simulated mapping failure".to_string(),
                            }),
                        }
                    } else if let Some(target) = state.indices.get_mut(&index) {
                        let replaced = target.docs.insert(id.clone(), document).is_some();
                        BulkItemOutcome {
                            operation: "index".to_string(),
                            id,
                            status: if replaced { 200 } else { 201 },
                            error: None,
                        }
                    } else {
                        any_errors = true;
                        BulkItemOutcome {
                            operation: "index".to_string(),
                            id,
                            status: 404,
                            error: Some(BulkItemError {
                                error_type: "index_not_found_exception".to_string(),
                                reason: format!("no such index [{}]", index),
                            }),
                        }
                    }
                }
                BulkOperation::Delete { index, id } => {
                    let removed = state
                        .indices
                        .get_mut(&index)
                        .map(|i| i.docs.remove(&id).is_some())
                        .unwrap_or(false);
                    BulkItemOutcome {
                        operation: "delete".to_string(),
                        id,
                        status: if removed { 200 } else { 404 },
                        error: None,
                    }
                }
            };
            items.push(outcome);
        }

        Ok(BulkResponse { any_errors, items })
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<bool, ClusterError> {
        let mut state = self.state.lock().unwrap();

        // Validate first so the whole list applies atomically or not at all.
        for action in actions {
            if let AliasAction::Add { index, .. } = action {
                if !state.indices.contains_key(index) {
                    return Err(ClusterError::unexpected(
                        404,
                        format!("index_not_found_exception: no such index [{}]", index),
                    ));
                }
            }
        }

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    state
                        .aliases
                        .entry(alias.clone())
                        .or_default()
                        .insert(index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if let Some(set) = state.aliases.get_mut(alias) {
                        set.remove(index);
                        if set.is_empty() {
                            state.aliases.remove(alias);
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    async fn alias_indices(&self, alias: &str) -> Result<Vec<String>, ClusterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .aliases
            .get(alias)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn alias_exists(&self, alias: &str) -> Result<bool, ClusterError> {
        Ok(self.state.lock().unwrap().aliases.contains_key(alias))
    }

    async fn create_index(
        &self,
        name: &str,
        body: &Value,
        alias: Option<&str>,
    ) -> Result<bool, ClusterError> {
        let mut state = self.state.lock().unwrap();
        if state.indices.contains_key(name) {
            return Err(ClusterError::unexpected(
                400,
                format!("resource_already_exists_exception: index [{}]", name),
            ));
        }
        state.indices.insert(
            name.to_string(),
            MockIndex {
                body: body.clone(),
                docs: BTreeMap::new(),
            },
        );
        if let Some(alias) = alias {
            state
                .aliases
                .entry(alias.to_string())
                .or_default()
                .insert(name.to_string());
        }
        Ok(true)
    }

    async fn delete_index(&self, name: &str) -> Result<bool, ClusterError> {
        let mut state = self.state.lock().unwrap();
        let existed = state.indices.remove(name).is_some();
        state.aliases.retain(|_, set| {
            set.remove(name);
            !set.is_empty()
        });
        Ok(existed)
    }

    async fn index_exists(&self, name: &str) -> Result<bool, ClusterError> {
        Ok(self.state.lock().unwrap().indices.contains_key(name))
    }

    async fn indices_matching(&self, pattern: &str) -> Result<Vec<String>, ClusterError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .indices
            .keys()
            .filter(|name| Self::glob_match(pattern, name))
            .cloned()
            .collect())
    }

    async fn refresh_index(&self, name: &str) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        if !state.indices.contains_key(name) {
            return Err(ClusterError::unexpected(
                404,
                format!("index_not_found_exception: no such index [{}]", name),
            ));
        }
        state.refreshed.push(name.to_string());
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64, ClusterError> {
        let state = self.state.lock().unwrap();
        state
            .indices
            .get(index)
            .map(|i| i.docs.len() as u64)
            .ok_or_else(|| {
                ClusterError::unexpected(
                    404,
                    format!("index_not_found_exception: no such index [{}]", index),
                )
            })
    }

    async fn cluster_health(&self, request: HealthRequest) -> Result<ClusterHealth, ClusterError> {
        let state = self.state.lock().unwrap();
        let mut status = state.health;
        let mut timed_out = false;
        if let Some(index) = &request.index {
            if !state.indices.contains_key(index) {
                status = HealthStatus::Red;
                timed_out = request.wait_for_status.is_some();
            }
        }
        Ok(ClusterHealth {
            status,
            cluster_name: "mock-cluster".to_string(),
            number_of_nodes: 1,
            timed_out,
        })
    }

    async fn index_stats(&self, name: &str) -> Result<IndexStats, ClusterError> {
        let state = self.state.lock().unwrap();
        let index = state.indices.get(name).ok_or_else(|| {
            ClusterError::unexpected(
                404,
                format!("index_not_found_exception: no such index [{}]", name),
            )
        })?;
        let store_size_bytes: u64 = index
            .docs
            .values()
            .map(|d| d.to_string().len() as u64)
            .sum();
        Ok(IndexStats {
            doc_count: index.docs.len() as u64,
            store_size_bytes,
            indexing_rate: index.docs.len() as u64,
            search_rate: 0,
        })
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, ClusterError> {
        let state = self.state.lock().unwrap();
        let resolved = match Self::resolve(&state, index) {
            Some(resolved) => resolved,
            None => return Ok(None),
        };
        Ok(state
            .indices
            .get(&resolved)
            .and_then(|i| i.docs.get(id))
            .map(|doc| {
                json!({
                    "_index": resolved,
                    "_id": id,
                    "found": true,
                    "_source": doc
                })
            }))
    }

    async fn search(&self, index: &str, body: Value) -> Result<Value, ClusterError> {
        let state = self.state.lock().unwrap();
        let resolved = Self::resolve(&state, index).ok_or_else(|| {
            ClusterError::unexpected(
                404,
                format!("index_not_found_exception: no such index [{}]", index),
            )
        })?;

        let docs = &state.indices[&resolved].docs;
        let from = body.get("from").and_then(|f| f.as_u64()).unwrap_or(0) as usize;
        let size = body.get("size").and_then(|s| s.as_u64()).unwrap_or(10) as usize;

        let hits: Vec<Value> = docs
            .iter()
            .skip(from)
            .take(size)
            .map(|(id, doc)| {
                json!({
                    "_index": resolved,
                    "_id": id,
                    "_score": 1.0,
                    "_source": doc
                })
            })
            .collect();

        Ok(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": { "value": docs.len(), "relation": "eq" },
                "hits": hits
            }
        }))
    }

    async fn get_mappings(&self, pattern: &str) -> Result<Value, ClusterError> {
        let state = self.state.lock().unwrap();
        let mut out = serde_json::Map::new();
        for (name, index) in &state.indices {
            if Self::glob_match(pattern, name) {
                out.insert(
                    name.clone(),
                    json!({ "mappings": index.body.get("mappings").cloned().unwrap_or(json!({})) }),
                );
            }
        }
        Ok(Value::Object(out))
    }
}
