//! Peer registry for the lattice node.
//!
//! Tracks the live peer set and the representatives seen voting, and turns
//! decoded peer traffic into decisions: which gossiped endpoints to dial,
//! whether a telemetry_ack is accepted, which hashes a vote feeds to the
//! election engine. Socket I/O lives in `lattice-node`; the registry only
//! holds each connection's outbound frame queue.

pub mod error;
pub mod peer;
pub mod registry;
pub mod telemetry;

pub use error::NetworkError;
pub use peer::{FrameSender, Peer, Representative};
pub use registry::{PeerRegistry, VoteDispatch};
pub use telemetry::{TelemetryRejection, TelemetryVerdict, TELEMETRY_RESPONSE_TIMEOUT_MS};
