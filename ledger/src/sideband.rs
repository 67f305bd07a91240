//! Sideband: node-local metadata stored after each block.
//!
//! Field order is fixed; which fields are present depends on the block type:
//!
//! | field        | size | present for                     |
//! |--------------|------|---------------------------------|
//! | successor    | 32   | all                             |
//! | account      | 32   | send, receive, change           |
//! | height       | 8 BE | all but open                    |
//! | balance      | 16   | receive, open, change           |
//! | timestamp    | 8 BE | all                             |
//! | details      | 1    | state                           |
//! | source epoch | 1    | state                           |
//!
//! Fields a layout omits are derivable from the block itself (open blocks are
//! always height 1; state and open blocks name their account; send and state
//! blocks carry their balance). [`Sideband::decode`] leaves them at zero and
//! [`crate::StoredBlock`] fills them in from the block.

use lattice_types::{Account, Amount, BlockHash};
use serde::{Deserialize, Serialize};

use crate::block_type::BlockType;
use crate::error::CodecError;
use crate::reader::Reader;

const SEND_FLAG: u8 = 0x80;
const RECEIVE_FLAG: u8 = 0x40;
const EPOCH_FLAG: u8 = 0x20;
const EPOCH_MASK: u8 = 0x1f;

/// Subtype flags and epoch version of a state block, packed into one byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetails {
    pub epoch: u8,
    pub is_send: bool,
    pub is_receive: bool,
    pub is_epoch: bool,
}

impl BlockDetails {
    pub fn pack(&self) -> u8 {
        let mut byte = self.epoch & EPOCH_MASK;
        if self.is_send {
            byte |= SEND_FLAG;
        }
        if self.is_receive {
            byte |= RECEIVE_FLAG;
        }
        if self.is_epoch {
            byte |= EPOCH_FLAG;
        }
        byte
    }

    pub fn unpack(byte: u8) -> Self {
        Self {
            epoch: byte & EPOCH_MASK,
            is_send: byte & SEND_FLAG != 0,
            is_receive: byte & RECEIVE_FLAG != 0,
            is_epoch: byte & EPOCH_FLAG != 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sideband {
    pub successor: BlockHash,
    pub account: Account,
    pub height: u64,
    pub balance: Amount,
    /// Seconds since epoch at which the block was stored.
    pub timestamp: u64,
    pub details: BlockDetails,
    pub source_epoch: u8,
}

fn has_account(t: BlockType) -> bool {
    matches!(t, BlockType::Send | BlockType::Receive | BlockType::Change)
}

fn has_height(t: BlockType) -> bool {
    t != BlockType::Open
}

fn has_balance(t: BlockType) -> bool {
    matches!(t, BlockType::Receive | BlockType::Open | BlockType::Change)
}

impl Sideband {
    /// Decode the sideband layout for `block_type` from the front of `bytes`.
    pub fn decode(block_type: BlockType, bytes: &[u8]) -> Result<Self, CodecError> {
        if !block_type.is_block() {
            return Err(CodecError::UnknownBlockType(block_type.as_u8()));
        }
        let size = block_type.sideband_size();
        if bytes.len() < size {
            return Err(CodecError::Truncated {
                needed: size,
                available: bytes.len(),
            });
        }

        let mut r = Reader::new(bytes);
        let mut sideband = Sideband {
            successor: r.hash()?,
            ..Default::default()
        };
        if has_account(block_type) {
            sideband.account = r.account()?;
        }
        if has_height(block_type) {
            sideband.height = r.u64_be()?;
        }
        if has_balance(block_type) {
            sideband.balance = r.amount()?;
        }
        sideband.timestamp = r.u64_be()?;
        if block_type == BlockType::State {
            sideband.details = BlockDetails::unpack(r.u8()?);
            sideband.source_epoch = r.u8()?;
        }
        Ok(sideband)
    }

    /// Append the layout for `block_type` to `out`.
    pub fn encode_into(&self, block_type: BlockType, out: &mut Vec<u8>) {
        out.extend_from_slice(self.successor.as_bytes());
        if has_account(block_type) {
            out.extend_from_slice(self.account.as_bytes());
        }
        if has_height(block_type) {
            out.extend_from_slice(&self.height.to_be_bytes());
        }
        if has_balance(block_type) {
            out.extend_from_slice(&self.balance.to_be_bytes());
        }
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        if block_type == BlockType::State {
            out.push(self.details.pack());
            out.push(self.source_epoch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_pack_layout() {
        let d = BlockDetails {
            epoch: 2,
            is_send: true,
            is_receive: false,
            is_epoch: true,
        };
        assert_eq!(d.pack(), 0x80 | 0x20 | 0x02);
        assert_eq!(BlockDetails::unpack(0xa2), d);
    }

    #[test]
    fn encoded_sizes_match_table() {
        let sb = Sideband::default();
        for t in [
            BlockType::Send,
            BlockType::Receive,
            BlockType::Open,
            BlockType::Change,
            BlockType::State,
        ] {
            let mut out = Vec::new();
            sb.encode_into(t, &mut out);
            assert_eq!(out.len(), t.sideband_size(), "{}", t.as_str());
        }
    }

    #[test]
    fn change_sideband_balance_reconstructed_from_halves() {
        let sb = Sideband {
            successor: BlockHash::new([9; 32]),
            account: Account::from_slice(&[7; 32]).unwrap(),
            height: 42,
            balance: Amount::new((5u128 << 64) | 6),
            timestamp: 1_600_000_000,
            ..Default::default()
        };
        let mut out = Vec::new();
        sb.encode_into(BlockType::Change, &mut out);
        assert_eq!(&out[72..80], &5u64.to_be_bytes());
        assert_eq!(&out[80..88], &6u64.to_be_bytes());
        assert_eq!(Sideband::decode(BlockType::Change, &out), Ok(sb));
    }

    #[test]
    fn short_sideband_is_an_error() {
        assert!(matches!(
            Sideband::decode(BlockType::Send, &[0u8; 79]),
            Err(CodecError::Truncated { needed: 80, .. })
        ));
    }
}
