//! fleetgrid-registry — in-memory authoritative state of the fleet.
//!
//! The registry owns the only shared mutable collection in the system:
//! one `ServerRecord` per known game-server instance, kept in
//! registration order behind a single mutex. Register, heartbeat,
//! allocate, disconnect, and sample application all go through it;
//! everything else works from point-in-time `snapshot()` copies.
//!
//! # Concurrency
//!
//! Every operation locks the whole collection and does pure in-memory
//! work, so mutations are linearizable: two concurrent allocations can
//! never both take the last open slot. Network calls never run under
//! the lock.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use registry::FleetRegistry;
pub use types::{Registration, ServerId, ServerRecord, ServerStatus};
