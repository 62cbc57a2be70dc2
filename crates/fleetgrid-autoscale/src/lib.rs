//! fleetgrid-autoscale — the fleet reconciliation and scaling loop.
//!
//! Every tick: discover running instances, sample live player counts,
//! fold the samples into the registry, then size the fleet:
//!
//! ```text
//! total = max(known_instances, current_replicas)
//! empty = instances with currentPlayers == 0
//!
//! if empty == 0 and total < max_pods:  desired = total + 1   // headroom
//! else if empty > 1 and total > 1:     desired = total - 1   // drain one
//! else:                                desired = total
//! ```
//!
//! The step function moves at most one replica per tick, so a single
//! noisy sample cannot swing the fleet, and it never drains the last
//! instance. Ticks are single-flight: the loop awaits each tick before
//! sleeping again, so two ticks can never issue conflicting scale
//! calls.

pub mod controller;

pub use controller::{
    AutoscaleController, ControllerConfig, ScaleDecision, TickOutcome, desired_replicas,
};
