//! Peer identity and the records the registry keeps about each peer.

use std::fmt;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Exact length of a peer identifier (CID), in bytes.
pub const IDENTIFIER_LEN: usize = 39;

/// Lowest UDP port a peer may advertise for DHT traffic.
pub const MIN_DHT_PORT: u16 = 1024;

/// Stored user-agent strings are cut to this many characters.
pub const USER_AGENT_MAX_CHARS: usize = 256;

// ── PeerId ────────────────────────────────────────────────────────────────────

/// A validated 39-byte peer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("peer identifier must be {} bytes, got {0}", IDENTIFIER_LEN)]
pub struct PeerIdError(pub usize);

impl PeerId {
    pub fn parse(raw: &str) -> Result<Self, PeerIdError> {
        if raw.len() != IDENTIFIER_LEN {
            return Err(PeerIdError(raw.len()));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Everything the registry stores about one announced peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub identifier: PeerId,
    /// Source address observed by the transport, never client-supplied.
    pub address: IpAddr,
    /// Advertised DHT (UDP) port.
    pub port: u16,
    /// Number of registrations seen for this identifier.
    pub connection_count: u32,
    pub user_agent: Option<String>,
    /// Set only by an explicit liveness refresh.
    pub live: bool,
    /// Unix seconds of the last write to this record.
    pub last_seen: u64,
}

/// The public projection of a record handed out in bootstrap samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerContact {
    pub identifier: PeerId,
    pub address: IpAddr,
    pub port: u16,
}

impl From<PeerRecord> for PeerContact {
    fn from(record: PeerRecord) -> Self {
        Self {
            identifier: record.identifier,
            address: record.address,
            port: record.port,
        }
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Cut a user-agent to the stored width without splitting a character.
pub fn clamp_user_agent(user_agent: &str) -> String {
    user_agent.chars().take(USER_AGENT_MAX_CHARS).collect()
}
