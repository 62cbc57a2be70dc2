//! Registry API handlers.
//!
//! Validation and status mapping only; every state change goes through
//! `FleetRegistry`. Anomalies a game server cannot usefully react to
//! (heartbeat or disconnect naming an unknown id, disconnect at zero)
//! are logged and answered as accepted.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fleetgrid_registry::{Registration, RegistryError, ServerRecord};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Caller identity as extracted by the fronting auth layer.
fn caller_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-caller-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
}

fn default_max_players() -> u32 {
    10
}

// ── Registration ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    server_id: String,
    /// How often (seconds) the server should send heartbeats.
    heartbeat_interval: u64,
}

/// POST /api/v1/registry/register
pub async fn register(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if req.server_id.is_empty() {
        return error_response("serverId is required", StatusCode::BAD_REQUEST).into_response();
    }
    if req.host.is_empty() {
        return error_response("host is required", StatusCode::BAD_REQUEST).into_response();
    }
    if req.max_players == 0 {
        return error_response("maxPlayers must be at least 1", StatusCode::BAD_REQUEST)
            .into_response();
    }

    let server_id = req.server_id.clone();
    state.registry.register(Registration {
        id: req.server_id,
        host: req.host,
        port: req.port,
        max_players: req.max_players,
    });

    ApiResponse::ok(RegisterResponse {
        server_id,
        heartbeat_interval: state.heartbeat_interval_secs,
    })
    .into_response()
}

// ── Heartbeat ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub current_players: u32,
}

/// POST /api/v1/registry/heartbeat
pub async fn heartbeat(
    State(state): State<ApiState>,
    Json(req): Json<HeartbeatRequest>,
) -> impl IntoResponse {
    if req.server_id.is_empty() {
        return error_response("serverId is required", StatusCode::BAD_REQUEST).into_response();
    }

    if let Err(e) = state
        .registry
        .heartbeat(&req.server_id, req.current_players)
    {
        // The reporting server cannot usefully react; accept and record
        // the anomaly.
        warn!(server_id = %req.server_id, error = %e, "heartbeat from unknown server");
    }

    ApiResponse::ok("heartbeat received").into_response()
}

// ── Listing ────────────────────────────────────────────────────

/// GET /api/v1/registry/servers
pub async fn list_servers(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.registry.snapshot())
}

// ── Allocation ─────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationResponse {
    server_id: String,
    host: String,
    port: u16,
}

impl From<ServerRecord> for AllocationResponse {
    fn from(rec: ServerRecord) -> Self {
        Self {
            server_id: rec.id,
            host: rec.host,
            port: rec.port,
        }
    }
}

/// POST /api/v1/registry/allocate
pub async fn allocate(State(state): State<ApiState>, headers: HeaderMap) -> impl IntoResponse {
    match state.registry.allocate_any() {
        Ok(server) => {
            info!(server_id = %server.id, caller = caller_id(&headers), "player slot allocated");
            ApiResponse::ok(AllocationResponse::from(server)).into_response()
        }
        Err(RegistryError::NoCapacity) => error_response(
            "all game servers are currently full or none are registered",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .into_response(),
        Err(e) => {
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateChosenRequest {
    #[serde(default)]
    pub server_id: String,
}

/// POST /api/v1/registry/allocate-chosen
pub async fn allocate_chosen(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<AllocateChosenRequest>,
) -> impl IntoResponse {
    if req.server_id.is_empty() {
        return error_response("serverId is required", StatusCode::BAD_REQUEST).into_response();
    }

    match state.registry.allocate_chosen(&req.server_id) {
        Ok(server) => {
            info!(
                server_id = %server.id,
                caller = caller_id(&headers),
                "chosen player slot allocated"
            );
            ApiResponse::ok(AllocationResponse::from(server)).into_response()
        }
        Err(RegistryError::NotFound(_)) => {
            error_response("server not found", StatusCode::NOT_FOUND).into_response()
        }
        Err(RegistryError::Full(_)) => {
            error_response("server is full", StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
        Err(e) => {
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

// ── Disconnect ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    #[serde(default)]
    pub server_id: String,
}

/// POST /api/v1/registry/disconnect
pub async fn disconnect(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<DisconnectRequest>,
) -> impl IntoResponse {
    if req.server_id.is_empty() {
        return error_response("serverId is required", StatusCode::BAD_REQUEST).into_response();
    }

    match state.registry.disconnect(&req.server_id) {
        Ok(()) => info!(
            server_id = %req.server_id,
            caller = caller_id(&headers),
            "player disconnected"
        ),
        // Anomalies: accepted either way, the count never goes negative.
        Err(e) => warn!(server_id = %req.server_id, error = %e, "disconnect anomaly"),
    }

    ApiResponse::ok("disconnect recorded").into_response()
}

// ── Probes ─────────────────────────────────────────────────────

/// GET /ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health
pub async fn health() -> &'static str {
    "healthy"
}

/// GET /version
pub async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "fleetgrid",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
