//! The 8-byte header present on every network message.
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 1    | magic (`'R'`)                 |
//! | 1      | 1    | network id                    |
//! | 2      | 3    | version max / using / min     |
//! | 5      | 1    | message type                  |
//! | 6      | 2    | extensions, little-endian u16 |

use lattice_ledger::BlockType;
use lattice_types::{NetworkConstants, ProtocolVersion};
use serde::{Deserialize, Serialize};

pub const HEADER_SIZE: usize = 8;

/// All message types in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    Invalid = 0x00,
    NotAType = 0x01,
    Keepalive = 0x02,
    Publish = 0x03,
    ConfirmReq = 0x04,
    ConfirmAck = 0x05,
    BulkPull = 0x06,
    BulkPush = 0x07,
    FrontierReq = 0x08,
    NodeIdHandshake = 0x0a,
    BulkPullAccount = 0x0b,
    TelemetryReq = 0x0c,
    TelemetryAck = 0x0d,
    AscPullReq = 0x0e,
    AscPullAck = 0x0f,
}

impl MessageType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        let t = match byte {
            0x00 => Self::Invalid,
            0x01 => Self::NotAType,
            0x02 => Self::Keepalive,
            0x03 => Self::Publish,
            0x04 => Self::ConfirmReq,
            0x05 => Self::ConfirmAck,
            0x06 => Self::BulkPull,
            0x07 => Self::BulkPush,
            0x08 => Self::FrontierReq,
            0x0a => Self::NodeIdHandshake,
            0x0b => Self::BulkPullAccount,
            0x0c => Self::TelemetryReq,
            0x0d => Self::TelemetryAck,
            0x0e => Self::AscPullReq,
            0x0f => Self::AscPullAck,
            _ => return None,
        };
        Some(t)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::NotAType => "not_a_type",
            Self::Keepalive => "keepalive",
            Self::Publish => "publish",
            Self::ConfirmReq => "confirm_req",
            Self::ConfirmAck => "confirm_ack",
            Self::BulkPull => "bulk_pull",
            Self::BulkPush => "bulk_push",
            Self::FrontierReq => "frontier_req",
            Self::NodeIdHandshake => "node_id_handshake",
            Self::BulkPullAccount => "bulk_pull_account",
            Self::TelemetryReq => "telemetry_req",
            Self::TelemetryAck => "telemetry_ack",
            Self::AscPullReq => "asc_pull_req",
            Self::AscPullAck => "asc_pull_ack",
        }
    }
}

/// The 16-bit extension field. Its meaning depends on the message type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extensions(pub u16);

impl Extensions {
    const BLOCK_TYPE_MASK: u16 = 0x0f00;
    const COUNT_MASK: u16 = 0xf000;
    const TELEMETRY_SIZE_MASK: u16 = 0x03ff;

    pub const BULK_PULL_COUNT_PRESENT: u16 = 0x0001;
    pub const FRONTIER_CONFIRMED_ONLY: u16 = 0x0002;
    pub const HANDSHAKE_QUERY: u16 = 0x0001;
    pub const HANDSHAKE_RESPONSE: u16 = 0x0002;
    pub const HANDSHAKE_V2: u16 = 0x0004;

    /// Block type tag in bits 8–11 (publish, confirm_req).
    pub fn block_type_tag(self) -> u8 {
        ((self.0 & Self::BLOCK_TYPE_MASK) >> 8) as u8
    }

    pub fn block_type(self) -> Option<BlockType> {
        BlockType::from_u8(self.block_type_tag())
    }

    /// Item count in bits 12–15 (confirm_req roots, confirm_ack hashes).
    pub fn count(self) -> usize {
        ((self.0 & Self::COUNT_MASK) >> 12) as usize
    }

    /// Body size carried in bits 0–9 of a telemetry_ack.
    pub fn telemetry_size(self) -> usize {
        (self.0 & Self::TELEMETRY_SIZE_MASK) as usize
    }

    pub fn has(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn with_block_type(block_type: BlockType) -> Self {
        Self((block_type.as_u8() as u16) << 8)
    }

    pub fn with_count(self, count: usize) -> Self {
        Self((self.0 & !Self::COUNT_MASK) | (((count as u16) << 12) & Self::COUNT_MASK))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub magic: u8,
    pub network_id: u8,
    pub version: ProtocolVersion,
    /// Raw type byte; may not name a known [`MessageType`] until validated.
    pub message_type: u8,
    pub extensions: Extensions,
}

impl MessageHeader {
    pub fn new(constants: &NetworkConstants, message_type: MessageType, extensions: Extensions) -> Self {
        Self {
            magic: constants.magic,
            network_id: constants.id_byte,
            version: constants.version,
            message_type: message_type.as_u8(),
            extensions,
        }
    }

    /// Split raw header bytes into fields. Performs no validation.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: bytes[0],
            network_id: bytes[1],
            version: ProtocolVersion {
                max: bytes[2],
                using: bytes[3],
                min: bytes[4],
            },
            message_type: bytes[5],
            extensions: Extensions(u16::from_le_bytes([bytes[6], bytes[7]])),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let ext = self.extensions.0.to_le_bytes();
        [
            self.magic,
            self.network_id,
            self.version.max,
            self.version.using,
            self.version.min,
            self.message_type,
            ext[0],
            ext[1],
        ]
    }

    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u8(self.message_type)
    }
}
