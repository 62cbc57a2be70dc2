//! fleetgrid-discovery — orchestrator-driven fleet reconciliation.
//!
//! Queries the orchestrator for pods matching the fleet's label
//! selector and folds newly seen instances into the registry. Discovery
//! only ever adds: instances the registry already knows keep their live
//! player counts and endpoints untouched, and an orchestrator failure
//! abandons the pass without applying partial results.

pub mod discoverer;

pub use discoverer::{DiscoveryConfig, DiscoveryOutcome, FleetDiscoverer};
