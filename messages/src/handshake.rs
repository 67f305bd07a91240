//! node_id_handshake: cookie query and/or signed response.
//!
//! Extension bits: 0x1 query present (32-byte cookie), 0x2 response present
//! (node id + signature, 96 bytes), 0x4 response is v2 (node id + salt +
//! genesis + signature, 160 bytes). Query precedes response in the body.

use lattice_types::{BlockHash, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, MessageError};
use crate::header::Extensions;

pub const COOKIE_SIZE: usize = 32;
pub const RESPONSE_SIZE: usize = 32 + 64;
pub const RESPONSE_V2_SIZE: usize = 32 + 32 + 32 + 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeV2 {
    pub salt: [u8; 32],
    pub genesis: BlockHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub node_id: PublicKey,
    pub signature: Signature,
    pub v2: Option<HandshakeV2>,
}

impl HandshakeResponse {
    /// The bytes the responder signs for a given cookie.
    pub fn signed_payload(&self, cookie: &[u8; COOKIE_SIZE]) -> Vec<u8> {
        let mut payload = cookie.to_vec();
        if let Some(v2) = &self.v2 {
            payload.extend_from_slice(&v2.salt);
            payload.extend_from_slice(v2.genesis.as_bytes());
        }
        payload
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdHandshake {
    pub query: Option<[u8; COOKIE_SIZE]>,
    pub response: Option<HandshakeResponse>,
}

impl NodeIdHandshake {
    pub fn extensions(&self) -> Extensions {
        let mut bits = 0;
        if self.query.is_some() {
            bits |= Extensions::HANDSHAKE_QUERY;
        }
        if let Some(response) = &self.response {
            bits |= Extensions::HANDSHAKE_RESPONSE;
            if response.v2.is_some() {
                bits |= Extensions::HANDSHAKE_V2;
            }
        }
        Extensions(bits)
    }

    pub fn body_size(extensions: Extensions) -> usize {
        let mut size = 0;
        if extensions.has(Extensions::HANDSHAKE_QUERY) {
            size += COOKIE_SIZE;
        }
        if extensions.has(Extensions::HANDSHAKE_RESPONSE) {
            size += if extensions.has(Extensions::HANDSHAKE_V2) {
                RESPONSE_V2_SIZE
            } else {
                RESPONSE_SIZE
            };
        }
        size
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, Self::body_size(extensions))?;
        let mut handshake = Self::default();
        let mut rest = body;
        if extensions.has(Extensions::HANDSHAKE_QUERY) {
            let mut cookie = [0u8; COOKIE_SIZE];
            cookie.copy_from_slice(&rest[..COOKIE_SIZE]);
            handshake.query = Some(cookie);
            rest = &rest[COOKIE_SIZE..];
        }
        if extensions.has(Extensions::HANDSHAKE_RESPONSE) {
            let node_id = PublicKey::from_slice(rest).unwrap_or_default();
            rest = &rest[32..];
            let v2 = if extensions.has(Extensions::HANDSHAKE_V2) {
                let mut salt = [0u8; 32];
                salt.copy_from_slice(&rest[..32]);
                let genesis = BlockHash::from_slice(&rest[32..]).unwrap_or_default();
                rest = &rest[64..];
                Some(HandshakeV2 { salt, genesis })
            } else {
                None
            };
            let signature = Signature::from_slice(rest).unwrap_or_default();
            handshake.response = Some(HandshakeResponse {
                node_id,
                signature,
                v2,
            });
        }
        if handshake.query.is_none() && handshake.response.is_none() {
            return Err(MessageError::EmptyHandshake);
        }
        Ok(handshake)
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        if let Some(cookie) = &self.query {
            out.extend_from_slice(cookie);
        }
        if let Some(response) = &self.response {
            out.extend_from_slice(response.node_id.as_bytes());
            if let Some(v2) = &response.v2 {
                out.extend_from_slice(&v2.salt);
                out.extend_from_slice(v2.genesis.as_bytes());
            }
            out.extend_from_slice(response.signature.as_bytes());
        }
    }
}
