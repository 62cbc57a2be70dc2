//! fleetgrid-orchestrator — boundary to the pod orchestrator.
//!
//! The controller and discoverer consume exactly three operations from
//! the orchestrator: list running instances by label selector, read a
//! deployment's replica count, and set it. [`Orchestrator`] is the
//! dyn-safe seam those components are injected with;
//! [`KubeOrchestrator`] implements it over the Kubernetes REST API.

pub mod client;
pub mod error;

pub use client::{InstanceInfo, KubeOrchestrator, Orchestrator};
pub use error::{OrchestratorError, OrchestratorResult};
