//! fleetd — the FleetGrid daemon.
//!
//! Single binary that assembles the fleet subsystems:
//! - Fleet registry (in-memory, authoritative)
//! - Load sampler (per-instance player-count probes)
//! - Fleet discoverer (orchestrator pod reconciliation)
//! - Autoscale controller (periodic scaling loop)
//! - REST API
//!
//! # Usage
//!
//! ```text
//! fleetd serve --port 8080 --kube-api http://127.0.0.1:8001 \
//!     --namespace default --selector app=game-server \
//!     --deployment game-server --max-pods 10
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use fleetgrid_autoscale::{AutoscaleController, ControllerConfig};
use fleetgrid_discovery::{DiscoveryConfig, FleetDiscoverer};
use fleetgrid_orchestrator::{KubeOrchestrator, Orchestrator};
use fleetgrid_registry::FleetRegistry;
use fleetgrid_sampler::{HttpLoadSampler, LoadSampler};

#[derive(Parser)]
#[command(name = "fleetd", about = "FleetGrid daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the registry API and run the autoscale controller.
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Port to listen on.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Base URL of the orchestrator API (e.g. a kubectl proxy).
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    kube_api: String,

    /// Bearer token for the orchestrator API.
    #[arg(long)]
    kube_token: Option<String>,

    /// Namespace the fleet runs in.
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Label selector identifying fleet pods.
    #[arg(long, default_value = "app=game-server")]
    selector: String,

    /// Deployment whose replica count is managed.
    #[arg(long, default_value = "game-server")]
    deployment: String,

    /// Hard ceiling on fleet replicas.
    #[arg(long, default_value = "10")]
    max_pods: u32,

    /// Reconciliation tick interval in seconds.
    #[arg(long, default_value = "15")]
    reconcile_interval: u64,

    /// Per-instance sample probe timeout in seconds.
    #[arg(long, default_value = "2")]
    sample_timeout: u64,

    /// Status endpoint path served by each game server.
    #[arg(long, default_value = "/players")]
    sample_path: String,

    /// Game port assumed for discovered pods without an annotation.
    #[arg(long, default_value = "7777")]
    default_port: u16,

    /// Capacity assumed for discovered pods without an annotation.
    #[arg(long, default_value = "10")]
    default_max_players: u32,

    /// Heartbeat interval (seconds) advertised to registering servers.
    #[arg(long, default_value = "30")]
    heartbeat_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleetd=debug,fleetgrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("FleetGrid daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let registry = FleetRegistry::new();
    info!("fleet registry initialized");

    let mut kube = KubeOrchestrator::new(&args.kube_api)?;
    if let Some(token) = args.kube_token {
        kube = kube.with_token(token);
    }
    let orchestrator: Arc<dyn Orchestrator> = Arc::new(kube);
    info!(api = %args.kube_api, "orchestrator client initialized");

    let sampler: Arc<dyn LoadSampler> = Arc::new(HttpLoadSampler::new(
        args.sample_path,
        Duration::from_secs(args.sample_timeout),
    ));
    info!(timeout_secs = args.sample_timeout, "load sampler initialized");

    let discoverer = FleetDiscoverer::new(
        orchestrator.clone(),
        registry.clone(),
        DiscoveryConfig {
            selector: args.selector.clone(),
            namespace: args.namespace.clone(),
            default_port: args.default_port,
            default_max_players: args.default_max_players,
        },
    );
    info!(selector = %args.selector, namespace = %args.namespace, "fleet discoverer initialized");

    let controller = AutoscaleController::new(
        registry.clone(),
        discoverer,
        sampler,
        orchestrator,
        ControllerConfig {
            deployment: args.deployment,
            namespace: args.namespace,
            max_pods: args.max_pods,
            interval: Duration::from_secs(args.reconcile_interval),
        },
    );
    info!(
        interval = args.reconcile_interval,
        max_pods = args.max_pods,
        "autoscale controller initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start the controller loop ──────────────────────────────

    let controller_handle = tokio::spawn(async move {
        controller.run(shutdown_rx).await;
    });

    // ── Start the API server ───────────────────────────────────

    let router = fleetgrid_api::build_router(registry, args.heartbeat_interval);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for the controller to finish its tick.
    let _ = controller_handle.await;

    info!("FleetGrid daemon stopped");
    Ok(())
}
