//! Read-side endpoints: text search, criteria search, document lookup.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::state::ApiState;

/// Hard cap on search page size.
pub const MAX_SEARCH_LIMIT: usize = 100;

fn default_limit() -> usize {
    20
}

/// Fields searched when a text request does not name its own.
const DEFAULT_TEXT_FIELDS: [&str; 5] = [
    "ProductName^2",
    "SearchName",
    "ItemId",
    "ProductNumber",
    "Description",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearchRequest {
    pub query: String,
    pub alias: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaSearchRequest {
    pub criteria: Map<String, Value>,
    pub alias: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub sort: Option<Value>,
    pub aggs: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub source: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<SearchHit>,
    pub took_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
}

fn check_limit(limit: usize) -> Result<(), ApiError> {
    if limit == 0 || limit > MAX_SEARCH_LIMIT {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// POST /search/text
pub async fn text(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextSearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    check_limit(request.limit)?;

    let fields: Vec<String> = request
        .fields
        .unwrap_or_else(|| DEFAULT_TEXT_FIELDS.iter().map(|f| f.to_string()).collect());

    let mut body = json!({
        "query": {
            "multi_match": {
                "query": request.query,
                "fields": fields,
                "type": "best_fields",
                "fuzziness": "AUTO"
            }
        },
        "from": request.offset,
        "size": request.limit
    });
    if request.highlight {
        body["highlight"] = json!({
            "fields": {
                "ProductName": {},
                "SearchName": {},
                "Description": {}
            }
        });
    }

    let alias = request.alias.as_deref().unwrap_or(&state.default_alias);
    let response = state.gateway.search(alias, body).await?;
    Ok(Json(parse_search_response(&response)))
}

/// POST /search/criteria
///
/// Each criterion becomes a filter clause: an object value is a range, an
/// array is a terms match, a scalar is an exact term.
pub async fn criteria(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CriteriaSearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    check_limit(request.limit)?;

    let filters: Vec<Value> = request
        .criteria
        .iter()
        .map(|(field, value)| match value {
            Value::Object(_) => json!({ "range": { field: value } }),
            Value::Array(_) => json!({ "terms": { field: value } }),
            _ => json!({ "term": { field: value } }),
        })
        .collect();

    let mut body = json!({
        "query": {
            "bool": {
                "filter": filters
            }
        },
        "from": request.offset,
        "size": request.limit
    });
    if let Some(sort) = request.sort {
        body["sort"] = sort;
    }
    if let Some(aggs) = request.aggs {
        body["aggs"] = aggs;
    }

    let alias = request.alias.as_deref().unwrap_or(&state.default_alias);
    let response = state.gateway.search(alias, body).await?;
    Ok(Json(parse_search_response(&response)))
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub alias: Option<String>,
}

/// GET /:product_id
pub async fn get_product(
    State(state): State<Arc<ApiState>>,
    Path(product_id): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Value>, ApiError> {
    let alias = query.alias.as_deref().unwrap_or(&state.default_alias);
    state
        .gateway
        .get_document(alias, &product_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", product_id)))
}

fn parse_search_response(response: &Value) -> SearchResponse {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .map(|hits| {
            hits.iter()
                .map(|hit| SearchHit {
                    id: hit
                        .get("_id")
                        .and_then(|i| i.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    score: hit.get("_score").and_then(|s| s.as_f64()).unwrap_or(0.0),
                    source: hit.get("_source").cloned().unwrap_or(json!({})),
                    highlight: hit.get("highlight").cloned(),
                })
                .collect()
        })
        .unwrap_or_default();

    SearchResponse {
        total: response
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        hits,
        took_ms: response.get("took").and_then(|t| t.as_u64()).unwrap_or(0),
        aggregations: response.get("aggregations").cloned(),
    }
}
