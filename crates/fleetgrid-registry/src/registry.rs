//! FleetRegistry — thread-safe store of fleet server records.
//!
//! Records live in an insertion-ordered `Vec` behind one mutex, which
//! is also the allocation scan order. The registry hands out clones,
//! never references, so no caller can hold a record across the
//! exclusion boundary.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::types::{Registration, ServerRecord, ServerStatus};

/// Thread-safe fleet registry. Cheap to clone; all clones share state.
#[derive(Clone, Default)]
pub struct FleetRegistry {
    records: Arc<Mutex<Vec<ServerRecord>>>,
}

impl FleetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ServerRecord>> {
        // Critical sections are short and panic-free; a poisoned lock
        // means the process is already going down.
        self.records.lock().expect("fleet registry lock poisoned")
    }

    /// Register a new server or update an existing one.
    ///
    /// Updates overwrite `host`, `port`, and `max_players` and refresh
    /// `last_seen`; `current_players` is preserved, so a restarting
    /// instance keeps its last known load until its next heartbeat or
    /// sample. Returns true when the id was newly inserted.
    pub fn register(&self, reg: Registration) -> bool {
        let now = epoch_secs();
        let mut records = self.lock();
        match records.iter_mut().find(|r| r.id == reg.id) {
            Some(rec) => {
                rec.host = reg.host;
                rec.port = reg.port;
                rec.max_players = reg.max_players;
                rec.last_seen = now;
                rec.recompute_status();
                debug!(server_id = %rec.id, host = %rec.host, port = rec.port, "server re-registered");
                false
            }
            None => {
                let mut rec = ServerRecord {
                    id: reg.id,
                    host: reg.host,
                    port: reg.port,
                    current_players: 0,
                    max_players: reg.max_players,
                    status: ServerStatus::Available,
                    last_seen: now,
                };
                rec.recompute_status();
                info!(
                    server_id = %rec.id,
                    host = %rec.host,
                    port = rec.port,
                    max_players = rec.max_players,
                    "server registered"
                );
                records.push(rec);
                true
            }
        }
    }

    /// Insert a server only if its id is unknown; an existing record is
    /// left completely untouched. Returns true when inserted.
    ///
    /// This is the discovery path: reconciliation must never clobber
    /// live player counts or an endpoint the server registered itself.
    pub fn register_if_absent(&self, reg: Registration) -> bool {
        let now = epoch_secs();
        let mut records = self.lock();
        if records.iter().any(|r| r.id == reg.id) {
            return false;
        }
        let mut rec = ServerRecord {
            id: reg.id,
            host: reg.host,
            port: reg.port,
            current_players: 0,
            max_players: reg.max_players,
            status: ServerStatus::Available,
            last_seen: now,
        };
        rec.recompute_status();
        debug!(server_id = %rec.id, host = %rec.host, port = rec.port, "server inserted");
        records.push(rec);
        true
    }

    /// Apply an authoritative player count reported by the server itself.
    pub fn heartbeat(&self, id: &str, players: u32) -> RegistryResult<()> {
        let now = epoch_secs();
        let mut records = self.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        rec.current_players = players;
        rec.last_seen = now;
        rec.recompute_status();
        debug!(server_id = %id, players, status = ?rec.status, "heartbeat applied");
        Ok(())
    }

    /// Allocate one player slot on the first available server in
    /// registration order, returning the updated record.
    ///
    /// First-match-by-insertion-order is the documented tie-break
    /// policy: allocation is deterministic, not load-balanced.
    pub fn allocate_any(&self) -> RegistryResult<ServerRecord> {
        let mut records = self.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.status == ServerStatus::Available)
            .ok_or(RegistryError::NoCapacity)?;
        rec.current_players += 1;
        rec.recompute_status();
        debug!(server_id = %rec.id, players = rec.current_players, "slot allocated");
        Ok(rec.clone())
    }

    /// Allocate one player slot on a specific server.
    pub fn allocate_chosen(&self, id: &str) -> RegistryResult<ServerRecord> {
        let mut records = self.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if rec.current_players >= rec.max_players {
            return Err(RegistryError::Full(id.to_string()));
        }
        rec.current_players += 1;
        rec.recompute_status();
        debug!(server_id = %id, players = rec.current_players, "chosen slot allocated");
        Ok(rec.clone())
    }

    /// Release one player slot.
    ///
    /// An unknown id or a count already at zero is reported back as an
    /// anomaly without mutating anything; the count never goes negative.
    pub fn disconnect(&self, id: &str) -> RegistryResult<()> {
        let mut records = self.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if rec.current_players == 0 {
            return Err(RegistryError::Idle(id.to_string()));
        }
        rec.current_players -= 1;
        rec.recompute_status();
        debug!(server_id = %id, players = rec.current_players, "player disconnected");
        Ok(())
    }

    /// Apply a sampled player count taken at `observed_at` (unix secs).
    ///
    /// The sample loses only to a registration or heartbeat that landed
    /// after the sampling snapshot was taken (`last_seen > observed_at`);
    /// it wins ties. `last_seen` itself is not refreshed, since it
    /// records what the instance reported, not what was polled. Returns
    /// true when the sample was applied.
    pub fn apply_sample(&self, id: &str, players: u32, observed_at: u64) -> bool {
        let mut records = self.lock();
        let Some(rec) = records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if rec.last_seen > observed_at {
            debug!(server_id = %id, "sample superseded by a newer heartbeat, skipped");
            return false;
        }
        rec.current_players = players;
        rec.recompute_status();
        true
    }

    /// A consistent point-in-time copy of all records, in registration
    /// order. Mutating the copy does not affect the registry.
    pub fn snapshot(&self) -> Vec<ServerRecord> {
        self.lock().clone()
    }

    /// Number of known servers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry has no servers.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
