//! The five block layouts.
//!
//! Legacy blocks (send, receive, open, change) carry their proof-of-work
//! little-endian; state blocks carry it big-endian. Balances are 16 bytes
//! big-endian everywhere.

use lattice_crypto::blake2b_256_multi;
use lattice_types::{Account, Amount, BlockHash, Signature};
use serde::{Deserialize, Serialize};

use crate::block_type::BlockType;
use crate::error::CodecError;
use crate::reader::Reader;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendBlock {
    pub previous: BlockHash,
    pub destination: Account,
    pub balance: Amount,
    pub signature: Signature,
    pub work: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveBlock {
    pub previous: BlockHash,
    pub source: BlockHash,
    pub signature: Signature,
    pub work: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBlock {
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
    pub signature: Signature,
    pub work: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBlock {
    pub previous: BlockHash,
    pub representative: Account,
    pub signature: Signature,
    pub work: u64,
}

/// The unified block kind: every block carries the full account state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBlock {
    pub account: Account,
    pub previous: BlockHash,
    pub representative: Account,
    pub balance: Amount,
    /// Destination account for sends, source hash for receives, zero for changes.
    pub link: [u8; 32],
    pub signature: Signature,
    pub work: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
    State(StateBlock),
}

/// Hash preamble for state blocks: 32 bytes, last byte is the state tag.
const STATE_PREAMBLE: [u8; 32] = {
    let mut p = [0u8; 32];
    p[31] = BlockType::State as u8;
    p
};

impl Block {
    /// Decode a block body of the given type.
    ///
    /// `body` may be longer than the layout; extra bytes are ignored.
    pub fn decode(block_type: BlockType, body: &[u8]) -> Result<Self, CodecError> {
        let size = block_type.body_size();
        if !block_type.is_block() {
            return Err(CodecError::UnknownBlockType(block_type.as_u8()));
        }
        if body.len() < size {
            return Err(CodecError::Truncated {
                needed: size,
                available: body.len(),
            });
        }
        let mut r = Reader::new(body);
        let block = match block_type {
            BlockType::Send => Self::Send(SendBlock {
                previous: r.hash()?,
                destination: r.account()?,
                balance: r.amount()?,
                signature: r.signature()?,
                work: r.u64_le()?,
            }),
            BlockType::Receive => Self::Receive(ReceiveBlock {
                previous: r.hash()?,
                source: r.hash()?,
                signature: r.signature()?,
                work: r.u64_le()?,
            }),
            BlockType::Open => Self::Open(OpenBlock {
                source: r.hash()?,
                representative: r.account()?,
                account: r.account()?,
                signature: r.signature()?,
                work: r.u64_le()?,
            }),
            BlockType::Change => Self::Change(ChangeBlock {
                previous: r.hash()?,
                representative: r.account()?,
                signature: r.signature()?,
                work: r.u64_le()?,
            }),
            BlockType::State => Self::State(StateBlock {
                account: r.account()?,
                previous: r.hash()?,
                representative: r.account()?,
                balance: r.amount()?,
                link: r.take::<32>()?,
                signature: r.signature()?,
                work: r.u64_be()?,
            }),
            BlockType::Invalid | BlockType::NotABlock => {
                return Err(CodecError::UnknownBlockType(block_type.as_u8()))
            }
        };
        Ok(block)
    }

    /// Decode `tag ‖ body` as it appears in bootstrap streams.
    pub fn decode_tagged(bytes: &[u8]) -> Result<Self, CodecError> {
        let (&tag, body) = bytes.split_first().ok_or(CodecError::Truncated {
            needed: 1,
            available: 0,
        })?;
        Self::decode(BlockType::block_from_u8(tag)?, body)
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Send(_) => BlockType::Send,
            Self::Receive(_) => BlockType::Receive,
            Self::Open(_) => BlockType::Open,
            Self::Change(_) => BlockType::Change,
            Self::State(_) => BlockType::State,
        }
    }

    /// Append the body (no type tag) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Send(b) => {
                out.extend_from_slice(b.previous.as_bytes());
                out.extend_from_slice(b.destination.as_bytes());
                out.extend_from_slice(&b.balance.to_be_bytes());
                out.extend_from_slice(b.signature.as_bytes());
                out.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Receive(b) => {
                out.extend_from_slice(b.previous.as_bytes());
                out.extend_from_slice(b.source.as_bytes());
                out.extend_from_slice(b.signature.as_bytes());
                out.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Open(b) => {
                out.extend_from_slice(b.source.as_bytes());
                out.extend_from_slice(b.representative.as_bytes());
                out.extend_from_slice(b.account.as_bytes());
                out.extend_from_slice(b.signature.as_bytes());
                out.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Change(b) => {
                out.extend_from_slice(b.previous.as_bytes());
                out.extend_from_slice(b.representative.as_bytes());
                out.extend_from_slice(b.signature.as_bytes());
                out.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::State(b) => {
                out.extend_from_slice(b.account.as_bytes());
                out.extend_from_slice(b.previous.as_bytes());
                out.extend_from_slice(b.representative.as_bytes());
                out.extend_from_slice(&b.balance.to_be_bytes());
                out.extend_from_slice(&b.link);
                out.extend_from_slice(b.signature.as_bytes());
                out.extend_from_slice(&b.work.to_be_bytes());
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.block_type().body_size());
        self.encode_into(&mut out);
        out
    }

    /// `tag ‖ body`, the form used in bootstrap streams.
    pub fn to_tagged_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.block_type().body_size());
        out.push(self.block_type().as_u8());
        self.encode_into(&mut out);
        out
    }

    /// Blake2b-256 over the signed fields.
    pub fn hash(&self) -> BlockHash {
        let digest = match self {
            Self::Send(b) => blake2b_256_multi(&[
                b.previous.as_bytes(),
                b.destination.as_bytes(),
                &b.balance.to_be_bytes(),
            ]),
            Self::Receive(b) => blake2b_256_multi(&[b.previous.as_bytes(), b.source.as_bytes()]),
            Self::Open(b) => blake2b_256_multi(&[
                b.source.as_bytes(),
                b.representative.as_bytes(),
                b.account.as_bytes(),
            ]),
            Self::Change(b) => {
                blake2b_256_multi(&[b.previous.as_bytes(), b.representative.as_bytes()])
            }
            Self::State(b) => blake2b_256_multi(&[
                &STATE_PREAMBLE,
                b.account.as_bytes(),
                b.previous.as_bytes(),
                b.representative.as_bytes(),
                &b.balance.to_be_bytes(),
                &b.link,
            ]),
        };
        BlockHash::new(digest)
    }

    /// Previous block in the chain; zero for open blocks.
    pub fn previous(&self) -> BlockHash {
        match self {
            Self::Send(b) => b.previous,
            Self::Receive(b) => b.previous,
            Self::Open(_) => BlockHash::ZERO,
            Self::Change(b) => b.previous,
            Self::State(b) => b.previous,
        }
    }

    /// The owning account when the block itself names it.
    pub fn account(&self) -> Option<Account> {
        match self {
            Self::Open(b) => Some(b.account),
            Self::State(b) => Some(b.account),
            _ => None,
        }
    }

    /// The balance after this block when the block itself carries it.
    pub fn balance(&self) -> Option<Amount> {
        match self {
            Self::Send(b) => Some(b.balance),
            Self::State(b) => Some(b.balance),
            _ => None,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::Send(b) => &b.signature,
            Self::Receive(b) => &b.signature,
            Self::Open(b) => &b.signature,
            Self::Change(b) => &b.signature,
            Self::State(b) => &b.signature,
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Self::Send(b) => b.work,
            Self::Receive(b) => b.work,
            Self::Open(b) => b.work,
            Self::Change(b) => b.work,
            Self::State(b) => b.work,
        }
    }
}
