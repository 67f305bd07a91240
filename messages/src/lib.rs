//! Network message types for node-to-node communication.
//!
//! Every message is an 8-byte [`MessageHeader`] followed by a body whose
//! layout depends on the [`MessageType`] and the header's extension bits.
//! This crate holds the typed messages and their body encoders/decoders;
//! framing a byte stream into messages lives in `lattice-protocol`.

pub mod bootstrap;
pub mod endpoint;
pub mod error;
pub mod handshake;
pub mod header;
pub mod keepalive;
pub mod message;
pub mod publish;
pub mod telemetry;
pub mod vote;

pub use bootstrap::{BulkPull, BulkPullAccount, FrontierReq};
pub use endpoint::PeerEndpoint;
pub use error::MessageError;
pub use handshake::{HandshakeResponse, NodeIdHandshake};
pub use header::{Extensions, MessageHeader, MessageType, HEADER_SIZE};
pub use keepalive::Keepalive;
pub use message::Message;
pub use publish::{ConfirmReq, Publish};
pub use telemetry::TelemetryData;
pub use vote::Vote;
