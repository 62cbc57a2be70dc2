//! fleetgrid-sampler — live player-count sampling.
//!
//! Each game server exposes its current player count on a lightweight
//! status endpoint (`GET /players` returning a bare integer). The
//! sampler polls every known instance concurrently and reports
//! successes and failures per server id: one unreachable instance never
//! aborts the batch, and a count of 0 is valid data (an idle server is
//! a legitimate state, not "no data").
//!
//! The sampler never mutates the registry; the controller applies the
//! counts it returns.

pub mod error;
pub mod http;

pub use error::SampleError;
pub use http::{HttpLoadSampler, LoadSampler, SampleReport};
