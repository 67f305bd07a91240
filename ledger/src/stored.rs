//! Stored record: `tag ‖ body ‖ sideband`.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::block_type::BlockType;
use crate::error::CodecError;
use crate::sideband::Sideband;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub block: Block,
    pub sideband: Sideband,
}

impl StoredBlock {
    /// Wrap a block that was just received, before the ledger has placed it.
    ///
    /// Successor and (for legacy non-open blocks) height stay zero until the
    /// ledger links the chain.
    pub fn unlinked(block: Block, timestamp_secs: u64) -> Self {
        let mut sideband = Sideband {
            timestamp: timestamp_secs,
            ..Default::default()
        };
        if let Some(account) = block.account() {
            sideband.account = account;
        }
        if let Some(balance) = block.balance() {
            sideband.balance = balance;
        }
        if block.block_type() == BlockType::Open {
            sideband.height = 1;
        }
        Self { block, sideband }
    }

    /// Decode a stored record, slicing at `1 + body` and `1 + body + sideband`.
    ///
    /// Bytes beyond the sideband are ignored. Sideband fields the layout omits
    /// are filled in from the block.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (&tag, _) = bytes.split_first().ok_or(CodecError::Truncated {
            needed: 1,
            available: 0,
        })?;
        let block_type = BlockType::block_from_u8(tag)?;
        let body_end = 1 + block_type.body_size();
        let sideband_end = body_end + block_type.sideband_size();
        if bytes.len() < sideband_end {
            return Err(CodecError::Truncated {
                needed: sideband_end,
                available: bytes.len(),
            });
        }

        let block = Block::decode(block_type, &bytes[1..body_end])?;
        let mut sideband = Sideband::decode(block_type, &bytes[body_end..sideband_end])?;
        if let Some(account) = block.account() {
            sideband.account = account;
        }
        if let Some(balance) = block.balance() {
            sideband.balance = balance;
        }
        if block_type == BlockType::Open {
            sideband.height = 1;
        }
        Ok(Self { block, sideband })
    }

    pub fn encode(&self) -> Vec<u8> {
        let block_type = self.block.block_type();
        let mut out = Vec::with_capacity(1 + block_type.body_size() + block_type.sideband_size());
        out.push(block_type.as_u8());
        self.block.encode_into(&mut out);
        self.sideband.encode_into(block_type, &mut out);
        out
    }
}
