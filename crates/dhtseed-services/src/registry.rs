//! Peer registry: executes one validated command against the record store.
//!
//! Three modes, one store call each:
//! - Register:        upsert, then sample live peers for the reply
//! - LivenessRefresh: mark the (identifier, address) record live
//! - Deregister:      delete the (identifier, address) record
//!
//! Refresh and deregistration succeed even when nothing matched.

use std::sync::Arc;

use thiserror::Error;

use dhtseed_core::peer::{PeerContact, PeerId};
use dhtseed_core::request::{Command, Mode};
use dhtseed_core::wire;

use crate::sampler::PeerSampler;
use crate::store::{PeerMatch, PeerUpdate, PeerUpsert, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Missing CID")]
    MissingIdentifier,
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn status(&self) -> u16 {
        match self {
            RegistryError::MissingIdentifier => 400,
            RegistryError::Store(_) => 500,
        }
    }

    /// Message safe to show the caller; store details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            RegistryError::MissingIdentifier => "Missing CID",
            RegistryError::Store(_) => "Internal server error",
        }
    }
}

/// Outcome of a successfully handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Bootstrap sample for a registering peer.
    Nodes(Vec<PeerContact>),
    Live,
    Shutdown,
}

impl Reply {
    pub fn body(&self) -> String {
        match self {
            Reply::Nodes(contacts) => wire::render_nodes(contacts),
            Reply::Live => wire::LIVE_OK.to_string(),
            Reply::Shutdown => wire::SHUTDOWN_OK.to_string(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Reply::Nodes(_) => wire::XML_CONTENT_TYPE,
            Reply::Live | Reply::Shutdown => wire::TEXT_CONTENT_TYPE,
        }
    }
}

#[derive(Clone)]
pub struct PeerRegistry {
    store: Arc<dyn RecordStore>,
    sampler: PeerSampler,
}

impl PeerRegistry {
    pub fn new(store: Arc<dyn RecordStore>, sample_size: usize) -> Self {
        Self {
            store,
            sampler: PeerSampler::new(sample_size),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn handle(&self, command: &Command) -> Result<Reply, RegistryError> {
        match command.mode {
            Mode::Register => self.register(command),
            Mode::LivenessRefresh => self.refresh(command),
            Mode::Deregister => self.deregister(command),
        }
    }

    fn register(&self, command: &Command) -> Result<Reply, RegistryError> {
        let identifier = command.identifier.as_ref().ok_or_else(|| {
            tracing::debug!(addr = %command.address, "registration without identifier");
            RegistryError::MissingIdentifier
        })?;

        let record = self.store.upsert(&PeerUpsert {
            identifier: identifier.clone(),
            address: command.address,
            port: command.port,
            user_agent: command.user_agent.clone(),
        })?;
        tracing::info!(
            peer = identifier.short(),
            addr = %record.address,
            port = record.port,
            connections = record.connection_count,
            "peer registered"
        );

        let contacts = self.sampler.sample(self.store.as_ref(), identifier)?;
        tracing::debug!(
            peer = identifier.short(),
            sampled = contacts.len(),
            "bootstrap sample drawn"
        );
        Ok(Reply::Nodes(contacts))
    }

    fn refresh(&self, command: &Command) -> Result<Reply, RegistryError> {
        let Some(filter) = peer_match(command) else {
            tracing::debug!(addr = %command.address, "liveness refresh without identifier");
            return Ok(Reply::Live);
        };
        let updated = self.store.update_where(&filter, &PeerUpdate::mark_live())?;
        tracing::debug!(peer = filter.identifier.short(), updated, "liveness refreshed");
        Ok(Reply::Live)
    }

    fn deregister(&self, command: &Command) -> Result<Reply, RegistryError> {
        let Some(filter) = peer_match(command) else {
            tracing::debug!(addr = %command.address, "deregistration without identifier");
            return Ok(Reply::Shutdown);
        };
        let deleted = self.store.delete_where(&filter)?;
        if deleted > 0 {
            tracing::info!(peer = filter.identifier.short(), addr = %filter.address, "peer removed");
        }
        Ok(Reply::Shutdown)
    }
}

fn peer_match(command: &Command) -> Option<PeerMatch> {
    command.identifier.as_ref().map(|identifier: &PeerId| PeerMatch {
        identifier: identifier.clone(),
        address: command.address,
    })
}
