//! Block type tags and the fixed sizes they select.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    Invalid = 0x00,
    /// Stream terminator in bootstrap responses; never a real block.
    NotABlock = 0x01,
    Send = 0x02,
    Receive = 0x03,
    Open = 0x04,
    Change = 0x05,
    State = 0x06,
}

impl BlockType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Invalid),
            0x01 => Some(Self::NotABlock),
            0x02 => Some(Self::Send),
            0x03 => Some(Self::Receive),
            0x04 => Some(Self::Open),
            0x05 => Some(Self::Change),
            0x06 => Some(Self::State),
            _ => None,
        }
    }

    /// Like [`from_u8`](Self::from_u8) but only accepts the five real block kinds.
    pub fn block_from_u8(tag: u8) -> Result<Self, CodecError> {
        match Self::from_u8(tag) {
            Some(t) if t.is_block() => Ok(t),
            _ => Err(CodecError::UnknownBlockType(tag)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_block(self) -> bool {
        !matches!(self, Self::Invalid | Self::NotABlock)
    }

    /// Serialized body size in bytes (signature and work included).
    pub fn body_size(self) -> usize {
        match self {
            Self::Invalid | Self::NotABlock => 0,
            Self::Send => 152,
            Self::Receive => 136,
            Self::Open => 168,
            Self::Change => 136,
            Self::State => 216,
        }
    }

    /// Sideband size in bytes for this block kind.
    pub fn sideband_size(self) -> usize {
        match self {
            Self::Invalid | Self::NotABlock => 0,
            Self::Send => 80,
            Self::Receive => 96,
            Self::Open => 56,
            Self::Change => 96,
            Self::State => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::NotABlock => "not_a_block",
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Open => "open",
            Self::Change => "change",
            Self::State => "state",
        }
    }
}
