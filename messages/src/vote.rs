//! Votes, carried by confirm_ack.
//!
//! Body: 32-byte representative, 64-byte signature, 8-byte timestamp, then
//! `count` 32-byte block hashes where `count` is extension bits 12–15.

use lattice_ledger::BlockType;
use lattice_types::{Account, BlockHash, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, MessageError};
use crate::header::Extensions;

pub const VOTE_FIXED_SIZE: usize = 32 + 64 + 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub account: Account,
    pub signature: Signature,
    /// Raw timestamp field, little-endian on the wire.
    pub timestamp: u64,
    pub hashes: Vec<BlockHash>,
}

impl Vote {
    pub const MAX_HASHES: usize = 15;

    pub fn extensions(&self) -> Extensions {
        Extensions::with_block_type(BlockType::NotABlock).with_count(self.hashes.len())
    }

    pub fn body_size(count: usize) -> usize {
        VOTE_FIXED_SIZE + count * 32
    }

    /// The bytes the representative signs: timestamp followed by the hashes.
    pub fn signed_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(8 + self.hashes.len() * 32);
        payload.extend_from_slice(&self.timestamp.to_le_bytes());
        for hash in &self.hashes {
            payload.extend_from_slice(hash.as_bytes());
        }
        payload
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        let count = extensions.count();
        ensure_len(body, Self::body_size(count))?;
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&body[32..96]);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&body[96..104]);
        let hashes = body[VOTE_FIXED_SIZE..]
            .chunks_exact(32)
            .take(count)
            .filter_map(BlockHash::from_slice)
            .collect();
        let account = PublicKey::from_slice(body).ok_or(MessageError::Truncated {
            needed: 32,
            available: body.len(),
        })?;
        Ok(Self {
            account,
            signature: Signature(signature),
            timestamp: u64::from_le_bytes(timestamp),
            hashes,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.account.as_bytes());
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        for hash in self.hashes.iter().take(Self::MAX_HASHES) {
            out.extend_from_slice(hash.as_bytes());
        }
    }
}
