//! Registry API flow tests.
//!
//! Drives the axum router end to end: registration, heartbeats,
//! allocation up to capacity, disconnects, and the probe endpoints.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use fleetgrid_api::build_router;
use fleetgrid_registry::FleetRegistry;

fn test_router() -> Router {
    build_router(FleetRegistry::new(), 30)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn register_then_allocate_until_full() {
    let router = test_router();

    // Register a two-slot server.
    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.1", "port": 7777, "maxPlayers": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["serverId"], "s1");
    assert_eq!(body["data"]["heartbeatInterval"], 30);

    // First allocation.
    let resp = router
        .clone()
        .oneshot(post_json("/api/v1/registry/allocate", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["serverId"], "s1");
    assert_eq!(body["data"]["host"], "10.0.0.1");
    assert_eq!(body["data"]["port"], 7777);

    // Second allocation fills the server.
    let resp = router
        .clone()
        .oneshot(post_json("/api/v1/registry/allocate", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Third fails: no capacity anywhere.
    let resp = router
        .clone()
        .oneshot(post_json("/api/v1/registry/allocate", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The list shows the server full.
    let resp = router
        .oneshot(get("/api/v1/registry/servers"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let servers = body["data"].as_array().unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["currentPlayers"], 2);
    assert_eq!(servers[0]["status"], "full");
}

#[tokio::test]
async fn register_validates_input() {
    let router = test_router();

    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "host": "10.0.0.1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = router
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn heartbeat_updates_the_player_count() {
    let router = test_router();

    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.1", "port": 7777, "maxPlayers": 16 }),
        ))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/heartbeat",
            json!({ "serverId": "s1", "currentPlayers": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(get("/api/v1/registry/servers"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"][0]["currentPlayers"], 5);
    assert_eq!(body["data"][0]["status"], "available");
}

#[tokio::test]
async fn heartbeat_from_unknown_server_is_accepted() {
    let router = test_router();

    let resp = router
        .oneshot(post_json(
            "/api/v1/registry/heartbeat",
            json!({ "serverId": "ghost", "currentPlayers": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn allocate_chosen_maps_errors() {
    let router = test_router();

    // Unknown server.
    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/allocate-chosen",
            json!({ "serverId": "ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Fill a one-slot server, then choose it again.
    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.1", "port": 7777, "maxPlayers": 1 }),
        ))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/allocate-chosen",
            json!({ "serverId": "s1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(post_json(
            "/api/v1/registry/allocate-chosen",
            json!({ "serverId": "s1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn disconnect_reopens_a_full_server() {
    let router = test_router();

    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.1", "port": 7777, "maxPlayers": 1 }),
        ))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(post_json("/api/v1/registry/allocate", json!({})))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/disconnect",
            json!({ "serverId": "s1" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The slot is free again.
    let resp = router
        .oneshot(post_json("/api/v1/registry/allocate", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn reregister_preserves_the_player_count() {
    let router = test_router();

    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.5", "port": 8000, "maxPlayers": 10 }),
        ))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/heartbeat",
            json!({ "serverId": "s1", "currentPlayers": 4 }),
        ))
        .await
        .unwrap();

    // Server restarts with a new port and capacity.
    router
        .clone()
        .oneshot(post_json(
            "/api/v1/registry/register",
            json!({ "serverId": "s1", "host": "10.0.0.5", "port": 9000, "maxPlayers": 32 }),
        ))
        .await
        .unwrap();

    let resp = router
        .oneshot(get("/api/v1/registry/servers"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let servers = body["data"].as_array().unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["port"], 9000);
    assert_eq!(servers[0]["maxPlayers"], 32);
    assert_eq!(servers[0]["currentPlayers"], 4);
}

#[tokio::test]
async fn probe_endpoints_answer() {
    let router = test_router();

    let resp = router.clone().oneshot(get("/ping")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "pong");

    let resp = router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(body_text(resp).await, "healthy");

    let resp = router.oneshot(get("/version")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["service"], "fleetgrid");
}
