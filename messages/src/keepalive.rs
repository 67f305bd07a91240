//! Keepalive: eight peer endpoints, 144 bytes.

use serde::{Deserialize, Serialize};

use crate::endpoint::{PeerEndpoint, ENDPOINT_SIZE};
use crate::error::{ensure_len, MessageError};

pub const KEEPALIVE_PEERS: usize = 8;
pub const KEEPALIVE_SIZE: usize = KEEPALIVE_PEERS * ENDPOINT_SIZE;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keepalive {
    pub peers: [PeerEndpoint; KEEPALIVE_PEERS],
}

impl Keepalive {
    /// Fill from up to eight endpoints; the rest stay wildcard.
    pub fn from_endpoints(endpoints: impl IntoIterator<Item = PeerEndpoint>) -> Self {
        let mut peers = [PeerEndpoint::default(); KEEPALIVE_PEERS];
        for (slot, ep) in peers.iter_mut().zip(endpoints) {
            *slot = ep;
        }
        Self { peers }
    }

    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, KEEPALIVE_SIZE)?;
        let mut peers = [PeerEndpoint::default(); KEEPALIVE_PEERS];
        for (slot, chunk) in peers.iter_mut().zip(body.chunks_exact(ENDPOINT_SIZE)) {
            let mut raw = [0u8; ENDPOINT_SIZE];
            raw.copy_from_slice(chunk);
            *slot = PeerEndpoint::from_bytes(&raw);
        }
        Ok(Self { peers })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for ep in &self.peers {
            out.extend_from_slice(&ep.to_bytes());
        }
    }
}
