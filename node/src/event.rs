//! Typed node events, delivered to subscribers over a broadcast channel.

use lattice_consensus::ElectionSummary;
use lattice_messages::{Message, PeerEndpoint, TelemetryData, Vote};
use lattice_network::TelemetryVerdict;
use lattice_types::PublicKey;

#[derive(Clone, Debug)]
pub enum NodeEvent {
    /// The peer proved ownership of `node_id`.
    Handshake { peer: PeerEndpoint, node_id: PublicKey },
    /// Any decoded message, before it is dispatched.
    Message { peer: PeerEndpoint, message: Message },
    Vote { peer: PeerEndpoint, vote: Vote, valid: bool },
    /// Emitted for every telemetry_ack, accepted or not.
    Telemetry {
        peer: PeerEndpoint,
        telemetry: TelemetryData,
        verdict: TelemetryVerdict,
    },
    ElectionStarted(ElectionSummary),
    ElectionConfirmed(ElectionSummary),
    PeerClosed(PeerEndpoint),
    Error { peer: PeerEndpoint, error: String },
}

impl NodeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Handshake { .. } => "handshake",
            Self::Message { .. } => "message",
            Self::Vote { .. } => "vote",
            Self::Telemetry { .. } => "telemetry",
            Self::ElectionStarted(_) => "election_started",
            Self::ElectionConfirmed(_) => "election_confirmed",
            Self::PeerClosed(_) => "close",
            Self::Error { .. } => "error",
        }
    }
}
