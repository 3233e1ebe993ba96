//! Record store trait: the registry's only shared state.
//!
//! Every request is a single store call (or, for registration, one write and
//! one read). Implementations must make `upsert` atomic per identifier so
//! concurrent registrations converge on one record with one counter.

use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

use dhtseed_core::peer::{PeerId, PeerRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to open {0}: {1}")]
    Open(PathBuf, rusqlite::Error),
    #[error("corrupt record {identifier}: {reason}")]
    Corrupt { identifier: String, reason: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Fields written by a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerUpsert {
    pub identifier: PeerId,
    pub address: IpAddr,
    pub port: u16,
    pub user_agent: Option<String>,
}

/// Selects the record owned by `identifier` as seen from `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMatch {
    pub identifier: PeerId,
    pub address: IpAddr,
}

impl PeerMatch {
    pub fn matches(&self, record: &PeerRecord) -> bool {
        record.identifier == self.identifier && record.address == self.address
    }
}

/// Columns changed by `update_where`. `None` leaves a column as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerUpdate {
    pub live: Option<bool>,
}

impl PeerUpdate {
    pub fn mark_live() -> Self {
        Self { live: Some(true) }
    }
}

/// Predicate and shape of a `query_where` read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerQuery {
    /// Only records with this liveness.
    pub live: Option<bool>,
    /// Skip this identifier.
    pub exclude: Option<PeerId>,
    /// Return rows in random order.
    pub random: bool,
    pub limit: Option<usize>,
}

impl PeerQuery {
    /// Live peers other than `requester`, randomly ordered, at most `limit`.
    pub fn live_sample(requester: &PeerId, limit: usize) -> Self {
        Self {
            live: Some(true),
            exclude: Some(requester.clone()),
            random: true,
            limit: Some(limit),
        }
    }

    pub fn matches(&self, record: &PeerRecord) -> bool {
        self.live.map_or(true, |live| record.live == live)
            && self
                .exclude
                .as_ref()
                .map_or(true, |id| &record.identifier != id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub peers: usize,
    pub live_peers: usize,
}

/// Durable keyed storage for peer records.
pub trait RecordStore: Send + Sync {
    /// Insert a record with `connection_count = 1` and `live = false`, or, if
    /// the identifier exists, refresh address/port/user-agent and add 1 to
    /// the count. `live` is never touched. Returns the stored record.
    fn upsert(&self, peer: &PeerUpsert) -> Result<PeerRecord, StoreError>;

    /// Apply `update` to every matching record. Returns rows affected.
    fn update_where(&self, filter: &PeerMatch, update: &PeerUpdate) -> Result<usize, StoreError>;

    /// Delete every matching record. Returns rows affected.
    fn delete_where(&self, filter: &PeerMatch) -> Result<usize, StoreError>;

    fn query_where(&self, query: &PeerQuery) -> Result<Vec<PeerRecord>, StoreError>;

    fn get(&self, identifier: &PeerId) -> Result<Option<PeerRecord>, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}
