//! Per-peer and per-representative records.

use lattice_messages::{PeerEndpoint, TelemetryData};
use lattice_types::{Account, PublicKey, Timestamp};
use tokio::sync::mpsc;

/// Outbound frame queue drained by a connection's writer task.
pub type FrameSender = mpsc::Sender<Vec<u8>>;

#[derive(Debug)]
pub struct Peer {
    pub endpoint: PeerEndpoint,
    /// Node id proven by the handshake; `None` until it completes.
    pub node_id: Option<PublicKey>,
    pub messages: u64,
    pub last_message: Option<Timestamp>,
    pub telemetry: Option<TelemetryData>,
    /// Set when a telemetry_req is sent, cleared when an ack is accepted.
    pub last_telemetry_req: Option<Timestamp>,
    /// `None` while an outbound connection is still being opened.
    pub(crate) sender: Option<FrameSender>,
}

impl Peer {
    pub(crate) fn placeholder(endpoint: PeerEndpoint) -> Self {
        Self {
            endpoint,
            node_id: None,
            messages: 0,
            last_message: None,
            telemetry: None,
            last_telemetry_req: None,
            sender: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    pub fn is_handshaken(&self) -> bool {
        self.node_id.is_some()
    }
}

/// A representative seen voting, with a running vote count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Representative {
    pub account: Account,
    /// Peer the first vote arrived from.
    pub first_seen_at: PeerEndpoint,
    pub votes: u64,
    pub last_vote: Option<Timestamp>,
}

impl Representative {
    pub(crate) fn new(account: Account, first_seen_at: PeerEndpoint) -> Self {
        Self {
            account,
            first_seen_at,
            votes: 0,
            last_vote: None,
        }
    }
}
