//! Autoscale controller — periodic discover/sample/decide/apply ticks.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use fleetgrid_discovery::FleetDiscoverer;
use fleetgrid_orchestrator::Orchestrator;
use fleetgrid_registry::FleetRegistry;
use fleetgrid_sampler::LoadSampler;

/// A scaling decision for the fleet deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Scale the deployment to the given replica count.
    ScaleTo(u32),
    /// Desired size equals the current replica count.
    NoChange,
}

/// Desired replica count for one tick.
///
/// Moves at most one unit away from `total`: add headroom when no
/// instance is idle and the ceiling allows it, drain one when more than
/// one instance sits idle, hold otherwise. A lone idle instance is
/// never drained, so a non-empty fleet never reaches zero.
pub fn desired_replicas(total: u32, empty: u32, max_pods: u32) -> u32 {
    if empty == 0 && total < max_pods {
        total + 1
    } else if empty > 1 && total > 1 {
        total - 1
    } else {
        total
    }
}

/// Static controller parameters.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Deployment whose replica count is managed.
    pub deployment: String,
    /// Namespace of the deployment.
    pub namespace: String,
    /// Hard ceiling on fleet replicas.
    pub max_pods: u32,
    /// Delay between ticks.
    pub interval: Duration,
}

/// What one tick did; returned for observability and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Instances newly added by discovery.
    pub discovered: usize,
    /// Samples applied to the registry.
    pub sampled: usize,
    /// Per-instance sample failures.
    pub sample_failures: usize,
    pub decision: ScaleDecision,
    /// Whether a scale call was issued and accepted.
    pub applied: bool,
}

/// The periodic reconciliation loop over the fleet.
pub struct AutoscaleController {
    registry: FleetRegistry,
    discoverer: FleetDiscoverer,
    sampler: Arc<dyn LoadSampler>,
    orchestrator: Arc<dyn Orchestrator>,
    config: ControllerConfig,
}

impl AutoscaleController {
    pub fn new(
        registry: FleetRegistry,
        discoverer: FleetDiscoverer,
        sampler: Arc<dyn LoadSampler>,
        orchestrator: Arc<dyn Orchestrator>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            registry,
            discoverer,
            sampler,
            orchestrator,
            config,
        }
    }

    /// One reconciliation tick. Public so tests can drive the loop
    /// directly.
    pub async fn tick(&self) -> anyhow::Result<TickOutcome> {
        // 1. Discover. A failure here abandons the tick with no side
        //    effects.
        let discovery = self
            .discoverer
            .reconcile()
            .await
            .map_err(|e| anyhow::anyhow!("discovery failed: {e}"))?;

        // 2. Sample against a snapshot; the registry lock is never held
        //    across network calls. A heartbeat that lands after
        //    `observed_at` beats the sample for its instance.
        let observed_at = epoch_secs();
        let snapshot = self.registry.snapshot();
        let report = self.sampler.sample_all(&snapshot).await;

        let mut sampled = 0;
        for (id, players) in &report.counts {
            if self.registry.apply_sample(id, *players, observed_at) {
                sampled += 1;
            }
        }
        for (id, err) in &report.failures {
            debug!(server_id = %id, error = %err, "load sample failed");
        }

        // 3. Decide from post-sample registry state plus the
        //    orchestrator's replica count. The registry updates above
        //    stand even if this read fails.
        let current_replicas = self
            .orchestrator
            .replica_count(&self.config.deployment, &self.config.namespace)
            .await
            .map_err(|e| anyhow::anyhow!("replica count read failed: {e}"))?;

        let records = self.registry.snapshot();
        let total = (records.len() as u32).max(current_replicas);
        let empty = records.iter().filter(|r| r.current_players == 0).count() as u32;
        let desired = desired_replicas(total, empty, self.config.max_pods);

        let decision = if desired == current_replicas {
            ScaleDecision::NoChange
        } else {
            ScaleDecision::ScaleTo(desired)
        };

        // 4. Apply. A failed scale call is not rolled back; the next
        //    tick retries from fresh data.
        let mut applied = false;
        if let ScaleDecision::ScaleTo(target) = decision {
            info!(
                total,
                empty, current_replicas, target, "scaling fleet deployment"
            );
            match self
                .orchestrator
                .set_replica_count(&self.config.deployment, &self.config.namespace, target)
                .await
            {
                Ok(()) => applied = true,
                Err(e) => warn!(target, error = %e, "scale call failed, retrying next tick"),
            }
        } else {
            debug!(total, empty, current_replicas, "fleet size unchanged");
        }

        Ok(TickOutcome {
            discovered: discovery.added,
            sampled,
            sample_failures: report.failures.len(),
            decision,
            applied,
        })
    }

    /// Run the controller loop until shutdown.
    ///
    /// The tick is awaited inline, so a tick that overruns the interval
    /// delays the next one: ticks never overlap.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            max_pods = self.config.max_pods,
            deployment = %self.config.deployment,
            "autoscale controller started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {
                    match self.tick().await {
                        Ok(outcome) => debug!(?outcome, "reconciliation tick complete"),
                        Err(e) => warn!(error = %e, "reconciliation tick abandoned"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("autoscale controller shutting down");
                    break;
                }
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
