//! dhtseed-services: the peer registry and the stores behind it.

pub mod memory_store;
pub mod registry;
pub mod sampler;
pub mod sqlite_store;
pub mod store;

pub use memory_store::MemoryStore;
pub use registry::{PeerRegistry, RegistryError, Reply};
pub use sampler::PeerSampler;
pub use sqlite_store::SqliteStore;
pub use store::{PeerMatch, PeerQuery, PeerUpdate, PeerUpsert, RecordStore, StoreError, StoreStats};
