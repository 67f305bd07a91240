//! Bootstrap response streams.
//!
//! A bulk_pull response is a sequence of `tag ‖ body` block records closed by
//! a lone not_a_block tag. A frontier_req response is a sequence of 64-byte
//! `account ‖ frontier` records closed by 64 zero bytes. Both terminators are
//! ordinary records to the [`FrameReader`], so they survive any chunking.

use lattice_ledger::{Block, BlockType};
use lattice_types::{Account, BlockHash, PublicKey};

use crate::error::ProtocolError;
use crate::frame::{FrameReader, Framing};

pub const FRONTIER_RECORD_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockStreamEvent {
    Block(Block),
    End,
}

#[derive(Debug, Default)]
pub struct BlockStreamFraming {
    block_type: Option<BlockType>,
}

impl Framing for BlockStreamFraming {
    type Output = BlockStreamEvent;

    fn prefix_len(&self) -> usize {
        1
    }

    fn record_len(&mut self, prefix: &[u8]) -> Result<usize, ProtocolError> {
        let tag = prefix[0];
        let block_type = match BlockType::from_u8(tag) {
            Some(BlockType::Invalid) | None => return Err(ProtocolError::InvalidBlockType(tag)),
            Some(t) => t,
        };
        self.block_type = Some(block_type);
        Ok(1 + block_type.body_size())
    }

    fn complete(&mut self, record: &[u8]) -> Result<BlockStreamEvent, ProtocolError> {
        let block_type = match self.block_type.take() {
            Some(t) => t,
            None => BlockType::from_u8(record[0]).ok_or(ProtocolError::InvalidBlockType(record[0]))?,
        };
        if block_type == BlockType::NotABlock {
            return Ok(BlockStreamEvent::End);
        }
        Ok(BlockStreamEvent::Block(Block::decode(block_type, &record[1..])?))
    }
}

pub type BlockStreamDecoder = FrameReader<BlockStreamFraming>;

impl BlockStreamDecoder {
    pub fn new_block_stream() -> Self {
        FrameReader::new(BlockStreamFraming::default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrontierStreamEvent {
    Frontier { account: Account, frontier: BlockHash },
    End,
}

#[derive(Debug, Default)]
pub struct FrontierStreamFraming;

impl Framing for FrontierStreamFraming {
    type Output = FrontierStreamEvent;

    fn prefix_len(&self) -> usize {
        FRONTIER_RECORD_SIZE
    }

    fn record_len(&mut self, _prefix: &[u8]) -> Result<usize, ProtocolError> {
        Ok(FRONTIER_RECORD_SIZE)
    }

    fn complete(&mut self, record: &[u8]) -> Result<FrontierStreamEvent, ProtocolError> {
        if record.iter().all(|&b| b == 0) {
            return Ok(FrontierStreamEvent::End);
        }
        let mut account = [0u8; 32];
        account.copy_from_slice(&record[..32]);
        let mut frontier = [0u8; 32];
        frontier.copy_from_slice(&record[32..64]);
        Ok(FrontierStreamEvent::Frontier {
            account: PublicKey(account),
            frontier: BlockHash::new(frontier),
        })
    }
}

pub type FrontierStreamDecoder = FrameReader<FrontierStreamFraming>;

impl FrontierStreamDecoder {
    pub fn new_frontier_stream() -> Self {
        FrameReader::new(FrontierStreamFraming)
    }
}
