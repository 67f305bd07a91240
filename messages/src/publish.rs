//! Block-carrying messages: publish and confirm_req.

use lattice_ledger::{Block, BlockType};
use lattice_types::BlockHash;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, MessageError};
use crate::header::Extensions;

/// Flood a block to peers. The block type travels in extension bits 8–11.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publish {
    pub block: Block,
}

impl Publish {
    pub fn extensions(&self) -> Extensions {
        Extensions::with_block_type(self.block.block_type())
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        let tag = extensions.block_type_tag();
        let block_type =
            BlockType::block_from_u8(tag).map_err(|_| MessageError::InvalidBlockType(tag))?;
        Ok(Self {
            block: Block::decode(block_type, body)?,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        self.block.encode_into(out);
    }
}

/// Ask peers to vote, either on a full block or on (hash, root) pairs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmReq {
    Block(Block),
    Roots(Vec<(BlockHash, BlockHash)>),
}

impl ConfirmReq {
    pub const MAX_ROOTS: usize = 15;

    pub fn extensions(&self) -> Extensions {
        match self {
            Self::Block(block) => Extensions::with_block_type(block.block_type()),
            Self::Roots(pairs) => {
                Extensions::with_block_type(BlockType::NotABlock).with_count(pairs.len())
            }
        }
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        match extensions.block_type() {
            Some(BlockType::NotABlock) => {
                let count = extensions.count();
                ensure_len(body, count * 64)?;
                let pairs = body
                    .chunks_exact(64)
                    .take(count)
                    .filter_map(|c| {
                        Some((BlockHash::from_slice(c)?, BlockHash::from_slice(&c[32..])?))
                    })
                    .collect();
                Ok(Self::Roots(pairs))
            }
            Some(t) if t.is_block() => Ok(Self::Block(Block::decode(t, body)?)),
            _ => Err(MessageError::InvalidBlockType(extensions.block_type_tag())),
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Block(block) => block.encode_into(out),
            Self::Roots(pairs) => {
                for (hash, root) in pairs.iter().take(Self::MAX_ROOTS) {
                    out.extend_from_slice(hash.as_bytes());
                    out.extend_from_slice(root.as_bytes());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_ledger::ReceiveBlock;
    use lattice_types::Signature;

    fn receive() -> Block {
        Block::Receive(ReceiveBlock {
            previous: BlockHash::new([1; 32]),
            source: BlockHash::new([2; 32]),
            signature: Signature([3; 64]),
            work: 4,
        })
    }

    #[test]
    fn publish_uses_extension_block_type() {
        let publish = Publish { block: receive() };
        let ext = publish.extensions();
        assert_eq!(ext.0, 0x0300);
        let mut body = Vec::new();
        publish.encode_into(&mut body);
        assert_eq!(Publish::decode(ext, &body), Ok(publish));
    }

    #[test]
    fn publish_rejects_non_block_type() {
        assert_eq!(
            Publish::decode(Extensions(0x0100), &[]),
            Err(MessageError::InvalidBlockType(1))
        );
    }

    #[test]
    fn confirm_req_roots() {
        let req = ConfirmReq::Roots(vec![
            (BlockHash::new([1; 32]), BlockHash::new([2; 32])),
            (BlockHash::new([3; 32]), BlockHash::new([4; 32])),
        ]);
        let ext = req.extensions();
        assert_eq!(ext.count(), 2);
        let mut body = Vec::new();
        req.encode_into(&mut body);
        assert_eq!(body.len(), 128);
        assert_eq!(ConfirmReq::decode(ext, &body), Ok(req));
    }
}
