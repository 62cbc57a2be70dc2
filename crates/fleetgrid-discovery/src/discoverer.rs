//! Fleet discoverer — idempotent pod-to-registry reconciliation.

use std::sync::Arc;

use tracing::{debug, info};

use fleetgrid_orchestrator::{Orchestrator, OrchestratorResult};
use fleetgrid_registry::{FleetRegistry, Registration};

/// Annotation a pod may carry to override the configured game port.
const PORT_ANNOTATION: &str = "fleetgrid.io/port";
/// Annotation a pod may carry to override the configured capacity.
const MAX_PLAYERS_ANNOTATION: &str = "fleetgrid.io/max-players";

/// Static discovery parameters.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Label selector identifying fleet pods.
    pub selector: String,
    /// Namespace the fleet runs in.
    pub namespace: String,
    /// Game port assumed when a pod does not advertise one.
    pub default_port: u16,
    /// Capacity assumed when a pod does not advertise one.
    pub default_max_players: u32,
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Instances the orchestrator reported in a running phase.
    pub running: usize,
    /// Instances newly added to the registry.
    pub added: usize,
}

/// Reconciles orchestrator-side pods into the fleet registry.
pub struct FleetDiscoverer {
    orchestrator: Arc<dyn Orchestrator>,
    registry: FleetRegistry,
    config: DiscoveryConfig,
}

impl FleetDiscoverer {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        registry: FleetRegistry,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            config,
        }
    }

    /// One reconcile pass: list pods, keep the running ones that have
    /// an address, and insert those the registry has not seen. Known
    /// instances are left untouched so live player counts survive.
    pub async fn reconcile(&self) -> OrchestratorResult<DiscoveryOutcome> {
        let instances = self
            .orchestrator
            .list_running_instances(&self.config.selector, &self.config.namespace)
            .await?;

        let mut outcome = DiscoveryOutcome {
            running: 0,
            added: 0,
        };
        for instance in instances {
            if instance.phase != "Running" || instance.address.is_empty() {
                debug!(
                    name = %instance.name,
                    phase = %instance.phase,
                    "skipping non-running instance"
                );
                continue;
            }
            outcome.running += 1;

            let port = instance
                .annotations
                .get(PORT_ANNOTATION)
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.config.default_port);
            let max_players = instance
                .annotations
                .get(MAX_PLAYERS_ANNOTATION)
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.config.default_max_players);

            let added = self.registry.register_if_absent(Registration {
                id: instance.name.clone(),
                host: instance.address.clone(),
                port,
                max_players,
            });
            if added {
                info!(
                    server_id = %instance.name,
                    host = %instance.address,
                    port,
                    "discovered new fleet instance"
                );
                outcome.added += 1;
            }
        }

        debug!(
            running = outcome.running,
            added = outcome.added,
            known = self.registry.len(),
            "reconcile pass complete"
        );
        Ok(outcome)
    }
}
