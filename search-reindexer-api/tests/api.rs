//! Router-level tests for the reindexer HTTP surface.
//!
//! These drive the full control plane against an in-memory cluster: session
//! lifecycle, blue/green promotion and rollback, searches, and the error
//! status mapping.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use search_reindexer_api::{router, ApiState};
use search_reindexer_deploy::{
    AliasRegistry, DeploymentCoordinator, HealthProbe, IndexLifecycle,
};
use search_reindexer_repository::testing::MockClusterGateway;
use search_reindexer_repository::{ClusterGateway, ProductMapping};
use search_reindexer_session::SessionManager;

fn build_test_router() -> (Arc<MockClusterGateway>, Router) {
    let gateway = Arc::new(MockClusterGateway::new());
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

    let state = Arc::new(
        ApiState::new(gateway.clone(), registry, coordinator, sessions)
            .with_default_alias("products-test"),
    );
    (gateway, router(state))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("valid JSON response")
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn docs(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({"id": id, "ProductName": format!("Product {}", id)}))
            .collect(),
    )
}

async fn run_session(router: &Router, alias: &str, ids: &[&str]) -> (String, Value) {
    let (status, session) = send(
        router,
        post_empty(&format!("/api/v1/products/{}/batch/start", alias)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = session["sessionId"].as_str().unwrap().to_string();

    let (status, result) = send(
        router,
        post_json(
            &format!("/api/v1/products/batch/{}/process", session_id),
            docs(ids),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["successful"], ids.len());
    assert_eq!(result["failed"], 0);

    let (status, state) = send(
        router,
        post_empty(&format!("/api/v1/products/batch/{}/complete", session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (session_id, state)
}

#[tokio::test]
async fn test_health_reports_connected_cluster() {
    let (_, router) = build_test_router();
    let (status, body) = send(&router, get("/api/v1/products/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api"], "ok");
    assert_eq!(body["elasticsearch"]["connected"], true);
}

#[tokio::test]
async fn test_first_safe_session_stages_blue_without_binding_alias() {
    let (gateway, router) = build_test_router();

    let (_, state) = run_session(&router, "products-test", &["A", "B", "C"]).await;
    assert_eq!(state["status"], "READY_FOR_SWAP");
    assert_eq!(state["stagingColor"], "blue");
    assert!(state.get("activeColor").is_none());

    let staging = state["stagingIndex"].as_str().unwrap();
    assert!(staging.starts_with("products-test_blue_"));
    assert_eq!(gateway.doc_count(staging), 3);
    assert!(!gateway.alias_exists("products-test").await.unwrap());

    let (status, alias_status) = send(&router, get("/api/v1/products/products-test/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alias_status["exists"], false);
    assert_eq!(alias_status["indices"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_promote_then_second_deployment_then_rollback() {
    let (gateway, router) = build_test_router();

    // First deployment: blue, promoted by hand.
    let (_, state) = run_session(&router, "products-test", &["A", "B", "C"]).await;
    let blue = state["stagingIndex"].as_str().unwrap().to_string();
    let (status, promoted) = send(
        &router,
        post_empty(&format!(
            "/api/v1/products/products-test/promote?targetIndex={}",
            blue
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["success"], true);
    assert_eq!(promoted["newActiveIndex"], blue.as_str());

    // Second deployment alternates to green.
    let (_, state) = run_session(&router, "products-test", &["D", "E", "F"]).await;
    assert_eq!(state["stagingColor"], "green");
    assert_eq!(state["activeIndex"], blue.as_str());
    let green = state["stagingIndex"].as_str().unwrap().to_string();

    let (status, _) = send(
        &router,
        post_empty(&format!(
            "/api/v1/products/products-test/promote?targetIndex={}",
            green
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, alias_status) = send(&router, get("/api/v1/products/products-test/status")).await;
    assert_eq!(alias_status["activeColor"], "green");

    // Queries against the alias now see the green documents.
    let (status, results) = send(
        &router,
        post_json(
            "/api/v1/products/search/text",
            json!({"query": "product", "alias": "products-test"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = results["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["D", "E", "F"]);

    // Rollback returns to blue and the original documents.
    let (status, rolled) = send(
        &router,
        post_empty("/api/v1/products/products-test/rollback"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rolled["newActiveIndex"], blue.as_str());
    assert_eq!(
        gateway.alias_indices("products-test").await.unwrap(),
        vec![blue]
    );

    let (_, results) = send(
        &router,
        post_json(
            "/api/v1/products/search/text",
            json!({"query": "product", "alias": "products-test"}),
        ),
    )
    .await;
    let ids: Vec<&str> = results["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_auto_swap_session_binds_alias() {
    let (gateway, router) = build_test_router();

    let (status, session) = send(
        &router,
        post_empty("/api/v1/products/products-test/batch/start?strategy=auto-swap&estimatedTotal=3"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["estimatedTotal"], 3);
    let session_id = session["sessionId"].as_str().unwrap();

    let (_, result) = send(
        &router,
        post_json(
            &format!("/api/v1/products/batch/{}/process", session_id),
            docs(&["A", "B", "C"]),
        ),
    )
    .await;
    assert_eq!(result["progress"], 100.0);

    let (status, state) = send(
        &router,
        post_empty(&format!("/api/v1/products/batch/{}/complete", session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], "COMPLETED");
    assert_eq!(state["activeColor"], "blue");
    assert!(gateway.alias_exists("products-test").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_ids_rejected_without_writes() {
    let (gateway, router) = build_test_router();

    let (_, session) = send(
        &router,
        post_empty("/api/v1/products/products-test/batch/start"),
    )
    .await;
    let session_id = session["sessionId"].as_str().unwrap();
    let target_index = session["targetIndex"].as_str().unwrap();

    let (status, error) = send(
        &router,
        post_json(
            &format!("/api/v1/products/batch/{}/process", session_id),
            docs(&["X", "Y", "X"]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("duplicate"));
    assert_eq!(gateway.doc_count(target_index), 0);

    let (_, snapshot) = send(
        &router,
        get(&format!("/api/v1/products/batch/{}/status", session_id)),
    )
    .await;
    assert_eq!(snapshot["totalBatches"], 0);
    assert_eq!(snapshot["status"], "active");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let (_, router) = build_test_router();

    let (status, _) = send(
        &router,
        get("/api/v1/products/batch/batch_0_missing00/status"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        post_json(
            "/api/v1/products/batch/batch_0_missing00/process",
            docs(&["A"]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_returns_204_and_deletes_index() {
    let (gateway, router) = build_test_router();

    let (_, session) = send(
        &router,
        post_empty("/api/v1/products/products-test/batch/start"),
    )
    .await;
    let session_id = session["sessionId"].as_str().unwrap();
    let target_index = session["targetIndex"].as_str().unwrap();
    assert!(gateway.index_exists(target_index).await.unwrap());

    let (status, _) = send(
        &router,
        post_empty(&format!("/api/v1/products/batch/{}/cancel", session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!gateway.index_exists(target_index).await.unwrap());
}

#[tokio::test]
async fn test_unsupported_strategy_is_400() {
    let (_, router) = build_test_router();
    let (status, error) = send(
        &router,
        post_empty("/api/v1/products/products-test/batch/start?strategy=yolo"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("strategy"));
}

#[tokio::test]
async fn test_rollback_without_previous_color_is_404() {
    let (_, router) = build_test_router();

    let (_, state) = run_session(&router, "products-test", &["A"]).await;
    let blue = state["stagingIndex"].as_str().unwrap().to_string();
    send(
        &router,
        post_empty(&format!(
            "/api/v1/products/products-test/promote?targetIndex={}",
            blue
        )),
    )
    .await;

    let (status, _) = send(
        &router,
        post_empty("/api/v1/products/products-test/rollback"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promote_missing_index_is_404() {
    let (_, router) = build_test_router();
    let (status, _) = send(
        &router,
        post_empty("/api/v1/products/products-test/promote?targetIndex=products-test_blue_20990101000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_limit_cap_is_400() {
    let (_, router) = build_test_router();
    let (status, _) = send(
        &router,
        post_json(
            "/api/v1/products/search/text",
            json!({"query": "widget", "limit": 101}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_criteria_search_and_document_lookup() {
    let (_, router) = build_test_router();

    let (_, state) = run_session(&router, "products-test", &["A", "B"]).await;
    let blue = state["stagingIndex"].as_str().unwrap().to_string();
    send(
        &router,
        post_empty(&format!(
            "/api/v1/products/products-test/promote?targetIndex={}",
            blue
        )),
    )
    .await;

    let (status, results) = send(
        &router,
        post_json(
            "/api/v1/products/search/criteria",
            json!({"criteria": {"ProductName": "Product A"}, "alias": "products-test"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(results["total"].as_u64().unwrap() >= 1);

    let (status, document) = send(&router, get("/api/v1/products/A?alias=products-test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(document["_id"], "A");
    assert_eq!(document["_source"]["ProductName"], "Product A");

    let (status, _) = send(&router, get("/api/v1/products/ZZZ?alias=products-test")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_active_sessions_listing() {
    let (_, router) = build_test_router();

    let (_, first) = send(
        &router,
        post_empty("/api/v1/products/products-test/batch/start"),
    )
    .await;
    send(
        &router,
        post_empty(&format!(
            "/api/v1/products/batch/{}/cancel",
            first["sessionId"].as_str().unwrap()
        )),
    )
    .await;
    let (_, second) = send(
        &router,
        post_empty("/api/v1/products/catalog-test/batch/start"),
    )
    .await;

    let (status, active) = send(&router, get("/api/v1/products/batch/active")).await;
    assert_eq!(status, StatusCode::OK);
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["sessionId"], second["sessionId"]);
}
