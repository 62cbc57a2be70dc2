//! fleetgrid-api — HTTP surface over the fleet registry.
//!
//! A thin axum layer: validates input, maps registry results to status
//! codes, and holds no business logic of its own.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/registry/register` | Register or update a server |
//! | POST | `/api/v1/registry/heartbeat` | Report liveness and player count |
//! | GET | `/api/v1/registry/servers` | List all known servers |
//! | POST | `/api/v1/registry/allocate` | Allocate any available server |
//! | POST | `/api/v1/registry/allocate-chosen` | Allocate a specific server |
//! | POST | `/api/v1/registry/disconnect` | Release one player slot |
//! | GET | `/ping` | Liveness probe |
//! | GET | `/health` | Health probe |
//! | GET | `/version` | Service version |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use fleetgrid_registry::FleetRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: FleetRegistry,
    /// Interval (seconds) advertised to game servers in the register
    /// response.
    pub heartbeat_interval_secs: u64,
}

/// Build the complete API router.
pub fn build_router(registry: FleetRegistry, heartbeat_interval_secs: u64) -> Router {
    let state = ApiState {
        registry,
        heartbeat_interval_secs,
    };

    let registry_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/servers", get(handlers::list_servers))
        .route("/allocate", post(handlers::allocate))
        .route("/allocate-chosen", post(handlers::allocate_chosen))
        .route("/disconnect", post(handlers::disconnect))
        .with_state(state);

    Router::new()
        .nest("/api/v1/registry", registry_routes)
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
}
