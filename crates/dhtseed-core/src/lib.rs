//! dhtseed-core: peer types, request validation, config, and the wire format.
//! All other dhtseed crates depend on this one.

pub mod config;
pub mod peer;
pub mod request;
pub mod wire;

pub use peer::{PeerContact, PeerId, PeerRecord};
pub use request::{Command, Mode, Rejection, RequestParams, RequestValidator, TransportMeta};
