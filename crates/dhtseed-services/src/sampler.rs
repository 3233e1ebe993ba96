//! Bootstrap sampling: picks the live peers handed to a registering peer.

use rand::seq::SliceRandom;

use dhtseed_core::config::{DEFAULT_SAMPLE_SIZE, MAX_SAMPLE_SIZE};
use dhtseed_core::peer::{PeerContact, PeerId};

use crate::store::{PeerQuery, RecordStore, StoreError};

/// Draws a uniformly shuffled subset of live peers, never including the
/// requester, never more than `limit`.
#[derive(Debug, Clone, Copy)]
pub struct PeerSampler {
    limit: usize,
}

impl Default for PeerSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl PeerSampler {
    /// `limit` is held to `1..=MAX_SAMPLE_SIZE`.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_SAMPLE_SIZE),
        }
    }

    pub fn sample(
        &self,
        store: &dyn RecordStore,
        requester: &PeerId,
    ) -> Result<Vec<PeerContact>, StoreError> {
        let rows = store.query_where(&PeerQuery::live_sample(requester, self.limit))?;

        // The store is asked for exactly this, but the guarantees are ours.
        let mut contacts: Vec<PeerContact> = rows
            .into_iter()
            .filter(|r| r.live && &r.identifier != requester)
            .map(PeerContact::from)
            .collect();
        contacts.shuffle(&mut rand::thread_rng());
        contacts.truncate(self.limit);
        Ok(contacts)
    }
}
