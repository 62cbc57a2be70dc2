//! Domain types for the fleet registry.
//!
//! `ServerRecord` doubles as the wire shape for list responses, so it
//! serializes camelCase (`serverId`, `currentPlayers`, ...) to match
//! the registration protocol the game servers speak.

use serde::{Deserialize, Serialize};

/// Unique identifier for a fleet instance. Assigned by the registering
/// server or, for discovered instances, the pod name.
pub type ServerId = String;

/// Availability of a server, derived from its player counts.
///
/// Recomputed inside the registry after every mutation of either count;
/// nothing else writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Available,
    Full,
}

/// One tracked game-server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    #[serde(rename = "serverId")]
    pub id: ServerId,
    pub host: String,
    pub port: u16,
    pub current_players: u32,
    /// Advertised capacity, at least 1.
    pub max_players: u32,
    pub status: ServerStatus,
    /// Unix timestamp (seconds) of the most recent registration or
    /// heartbeat. Recorded for a future staleness policy, not enforced.
    pub last_seen: u64,
}

impl ServerRecord {
    /// Address used for allocation routing and load sampling.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Re-derive `status` from the player counts.
    pub(crate) fn recompute_status(&mut self) {
        self.status = if self.current_players >= self.max_players {
            ServerStatus::Full
        } else {
            ServerStatus::Available
        };
    }
}

/// Input to a register call.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: ServerId,
    pub host: String,
    pub port: u16,
    pub max_players: u32,
}
