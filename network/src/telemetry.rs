//! Acceptance rules for inbound telemetry_ack messages.

use lattice_messages::TelemetryData;
use lattice_types::{PublicKey, Timestamp};

/// A telemetry_ack older than this, measured from its request, is late.
pub const TELEMETRY_RESPONSE_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryRejection {
    /// The payload's node id is not the id proven by the handshake.
    NodeIdMismatch,
    /// No telemetry_req is outstanding for the peer.
    Unsolicited,
    /// The request went out more than ten seconds ago.
    Late,
}

impl TelemetryRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeIdMismatch => "node_id_mismatch",
            Self::Unsolicited => "unsolicited",
            Self::Late => "late",
        }
    }
}

/// Every rule is evaluated; a mismatch can coexist with lateness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetryVerdict {
    pub mismatched: bool,
    pub unsolicited: bool,
    pub late: bool,
}

impl TelemetryVerdict {
    pub fn evaluate(
        telemetry: &TelemetryData,
        connected_node_id: Option<PublicKey>,
        last_request: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        let mismatched = connected_node_id != Some(telemetry.node_id);
        let (unsolicited, late) = match last_request {
            None => (true, false),
            Some(sent) => (false, sent.is_older_than(TELEMETRY_RESPONSE_TIMEOUT_MS, now)),
        };
        Self {
            mismatched,
            unsolicited,
            late,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.mismatched || self.unsolicited || self.late
    }

    /// Whether the sender still counts as the peer it claims to be.
    pub fn is_peer(&self) -> bool {
        !self.mismatched
    }

    pub fn rejections(&self) -> Vec<TelemetryRejection> {
        let mut out = Vec::new();
        if self.mismatched {
            out.push(TelemetryRejection::NodeIdMismatch);
        }
        if self.unsolicited {
            out.push(TelemetryRejection::Unsolicited);
        }
        if self.late {
            out.push(TelemetryRejection::Late);
        }
        out
    }
}
