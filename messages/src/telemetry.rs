//! Telemetry payload carried by telemetry_ack.
//!
//! Multi-byte integers are big-endian. The signature covers every byte after
//! the signature field itself.

use lattice_types::{BlockHash, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, MessageError};
use crate::header::Extensions;

pub const TELEMETRY_SIZE: usize = 202;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryData {
    pub signature: Signature,
    pub node_id: PublicKey,
    pub block_count: u64,
    pub cemented_count: u64,
    pub unchecked_count: u64,
    pub account_count: u64,
    pub bandwidth_cap: u64,
    pub peer_count: u32,
    pub protocol_version: u8,
    pub uptime: u64,
    pub genesis_block: BlockHash,
    pub major_version: u8,
    pub minor_version: u8,
    pub patch_version: u8,
    pub pre_release_version: u8,
    pub maker: u8,
    /// Milliseconds since epoch when the data was generated.
    pub timestamp: u64,
    pub active_difficulty: u64,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.take())
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }
}

impl TelemetryData {
    pub fn extensions(&self) -> Extensions {
        Extensions(TELEMETRY_SIZE as u16)
    }

    /// Decode the payload. `body` must hold at least the fixed layout;
    /// newer peers may append fields, which are ignored.
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, TELEMETRY_SIZE)?;
        let mut c = Cursor { bytes: body, pos: 0 };
        Ok(Self {
            signature: Signature(c.take()),
            node_id: PublicKey(c.take()),
            block_count: c.u64(),
            cemented_count: c.u64(),
            unchecked_count: c.u64(),
            account_count: c.u64(),
            bandwidth_cap: c.u64(),
            peer_count: u32::from_be_bytes(c.take()),
            protocol_version: c.u8(),
            uptime: c.u64(),
            genesis_block: BlockHash::new(c.take()),
            major_version: c.u8(),
            minor_version: c.u8(),
            patch_version: c.u8(),
            pre_release_version: c.u8(),
            maker: c.u8(),
            timestamp: c.u64(),
            active_difficulty: c.u64(),
        })
    }

    /// Everything after the signature.
    pub fn signed_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TELEMETRY_SIZE - 64);
        out.extend_from_slice(self.node_id.as_bytes());
        out.extend_from_slice(&self.block_count.to_be_bytes());
        out.extend_from_slice(&self.cemented_count.to_be_bytes());
        out.extend_from_slice(&self.unchecked_count.to_be_bytes());
        out.extend_from_slice(&self.account_count.to_be_bytes());
        out.extend_from_slice(&self.bandwidth_cap.to_be_bytes());
        out.extend_from_slice(&self.peer_count.to_be_bytes());
        out.push(self.protocol_version);
        out.extend_from_slice(&self.uptime.to_be_bytes());
        out.extend_from_slice(self.genesis_block.as_bytes());
        out.push(self.major_version);
        out.push(self.minor_version);
        out.push(self.patch_version);
        out.push(self.pre_release_version);
        out.push(self.maker);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.active_difficulty.to_be_bytes());
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&self.signed_payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryData {
        TelemetryData {
            signature: Signature([1; 64]),
            node_id: PublicKey([2; 32]),
            block_count: 100,
            cemented_count: 90,
            unchecked_count: 3,
            account_count: 40,
            bandwidth_cap: 10 * 1024 * 1024,
            peer_count: 12,
            protocol_version: 18,
            uptime: 3600,
            genesis_block: BlockHash::new([4; 32]),
            major_version: 21,
            minor_version: 2,
            patch_version: 0,
            pre_release_version: 0,
            maker: 0,
            timestamp: 1_600_000_000_000,
            active_difficulty: 0xffff_ffc0_0000_0000,
        }
    }

    #[test]
    fn encoded_size_and_offsets() {
        let t = sample();
        let mut body = Vec::new();
        t.encode_into(&mut body);
        assert_eq!(body.len(), TELEMETRY_SIZE);
        assert_eq!(&body[96..104], &100u64.to_be_bytes());
        assert_eq!(&body[136..140], &12u32.to_be_bytes());
        assert_eq!(body[140], 18);
        assert_eq!(TelemetryData::decode(&body), Ok(t));
    }

    #[test]
    fn extensions_carry_size() {
        assert_eq!(sample().extensions().telemetry_size(), TELEMETRY_SIZE);
    }

    #[test]
    fn short_payload_rejected() {
        assert!(TelemetryData::decode(&[0u8; 201]).is_err());
    }
}
