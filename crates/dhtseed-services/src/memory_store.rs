//! In-memory record store (does not persist across restarts).

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::{IteratorRandom, SliceRandom};

use dhtseed_core::peer::{now_secs, PeerId, PeerRecord};

use crate::store::{PeerMatch, PeerQuery, PeerUpdate, PeerUpsert, RecordStore, StoreError, StoreStats};

/// `DashMap`-backed store. Per-key entry locking makes `upsert` atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    peers: Arc<DashMap<PeerId, PeerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            peers: Arc::new(DashMap::new()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn upsert(&self, peer: &PeerUpsert) -> Result<PeerRecord, StoreError> {
        let now = now_secs();
        let record = match self.peers.entry(peer.identifier.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.address = peer.address;
                record.port = peer.port;
                record.user_agent = peer.user_agent.clone();
                record.connection_count = record.connection_count.saturating_add(1);
                record.last_seen = now;
                record.clone()
            }
            Entry::Vacant(entry) => entry
                .insert(PeerRecord {
                    identifier: peer.identifier.clone(),
                    address: peer.address,
                    port: peer.port,
                    connection_count: 1,
                    user_agent: peer.user_agent.clone(),
                    live: false,
                    last_seen: now,
                })
                .value()
                .clone(),
        };
        Ok(record)
    }

    fn update_where(&self, filter: &PeerMatch, update: &PeerUpdate) -> Result<usize, StoreError> {
        let Some(mut record) = self.peers.get_mut(&filter.identifier) else {
            return Ok(0);
        };
        if !filter.matches(&record) {
            return Ok(0);
        }
        if let Some(live) = update.live {
            record.live = live;
        }
        record.last_seen = now_secs();
        Ok(1)
    }

    fn delete_where(&self, filter: &PeerMatch) -> Result<usize, StoreError> {
        let removed = self
            .peers
            .remove_if(&filter.identifier, |_, record| filter.matches(record));
        Ok(usize::from(removed.is_some()))
    }

    fn query_where(&self, query: &PeerQuery) -> Result<Vec<PeerRecord>, StoreError> {
        let mut rng = rand::thread_rng();
        let matching = self
            .peers
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone());

        let mut rows = match (query.random, query.limit) {
            // reservoir sample: never holds more than `limit` rows
            (true, Some(limit)) => matching.choose_multiple(&mut rng, limit),
            (false, Some(limit)) => matching.take(limit).collect(),
            (_, None) => matching.collect(),
        };
        if query.random {
            rows.shuffle(&mut rng);
        }
        Ok(rows)
    }

    fn get(&self, identifier: &PeerId) -> Result<Option<PeerRecord>, StoreError> {
        Ok(self.peers.get(identifier).map(|r| r.value().clone()))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();
        for entry in self.peers.iter() {
            stats.peers += 1;
            if entry.value().live {
                stats.live_peers += 1;
            }
        }
        Ok(stats)
    }
}
