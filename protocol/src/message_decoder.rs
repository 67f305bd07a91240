//! Header-then-body decoding for node-to-node connections.
//!
//! The first record on every connection is a node_id_handshake; after that
//! any message type may follow. Each record is the 8-byte header plus a body
//! whose length [`body_length`] derives from the type and extension bits.

use std::sync::Arc;

use lattice_crypto::SignatureVerifier;
use lattice_ledger::BlockType;
use lattice_messages::{
    BulkPull, Extensions, Message, MessageHeader, MessageType, NodeIdHandshake, Vote,
    HEADER_SIZE,
};
use lattice_messages::bootstrap::{BULK_PULL_ACCOUNT_SIZE, FRONTIER_REQ_SIZE};
use lattice_messages::keepalive::KEEPALIVE_SIZE;
use lattice_types::NetworkConstants;
use tracing::trace;

use crate::error::ProtocolError;
use crate::frame::{FrameReader, Framing};

/// Body length for a message type and its extension bits.
pub fn body_length(message_type: MessageType, extensions: Extensions) -> Result<usize, ProtocolError> {
    let len = match message_type {
        MessageType::Invalid | MessageType::NotAType => {
            return Err(ProtocolError::UnknownMessageType(message_type.as_u8()))
        }
        MessageType::Keepalive => KEEPALIVE_SIZE,
        MessageType::Publish => match extensions.block_type() {
            Some(t) if t.is_block() => t.body_size(),
            _ => return Err(ProtocolError::InvalidBlockType(extensions.block_type_tag())),
        },
        MessageType::ConfirmReq => match extensions.block_type() {
            Some(BlockType::NotABlock) => extensions.count() * 64,
            Some(t) if t.is_block() => t.body_size(),
            _ => return Err(ProtocolError::InvalidBlockType(extensions.block_type_tag())),
        },
        MessageType::ConfirmAck => Vote::body_size(extensions.count()),
        MessageType::BulkPull => BulkPull::body_size(extensions),
        MessageType::BulkPush => 0,
        MessageType::FrontierReq => FRONTIER_REQ_SIZE,
        MessageType::NodeIdHandshake => NodeIdHandshake::body_size(extensions),
        MessageType::BulkPullAccount => BULK_PULL_ACCOUNT_SIZE,
        MessageType::TelemetryReq => 0,
        MessageType::TelemetryAck => extensions.telemetry_size(),
        MessageType::AscPullReq | MessageType::AscPullAck => extensions.0 as usize,
    };
    Ok(len)
}

/// A fully received message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedMessage {
    pub header: MessageHeader,
    pub message: Message,
    /// Signature check over (timestamp ‖ hashes) for confirm_ack; `None` otherwise.
    pub vote_valid: Option<bool>,
}

pub struct MessageFraming {
    constants: NetworkConstants,
    verifier: Arc<dyn SignatureVerifier>,
    header: Option<MessageHeader>,
    kind: Option<MessageType>,
}

impl MessageFraming {
    pub fn new(constants: NetworkConstants, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            constants,
            verifier,
            header: None,
            kind: None,
        }
    }

    fn parse_header(&self, prefix: &[u8]) -> Result<(MessageHeader, MessageType), ProtocolError> {
        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&prefix[..HEADER_SIZE]);
        let header = MessageHeader::from_bytes(&raw);
        if header.magic != self.constants.magic {
            return Err(ProtocolError::BadMagic(header.magic));
        }
        if header.network_id != self.constants.id_byte {
            return Err(ProtocolError::WrongNetwork {
                expected: self.constants.id_byte,
                got: header.network_id,
            });
        }
        let kind = header
            .kind()
            .ok_or(ProtocolError::UnknownMessageType(header.message_type))?;
        Ok((header, kind))
    }
}

impl Framing for MessageFraming {
    type Output = DecodedMessage;

    fn prefix_len(&self) -> usize {
        HEADER_SIZE
    }

    fn record_len(&mut self, prefix: &[u8]) -> Result<usize, ProtocolError> {
        let (header, kind) = self.parse_header(prefix)?;
        let len = body_length(kind, header.extensions)?;
        trace!(message_type = kind.as_str(), body_len = len, "header decoded");
        self.header = Some(header);
        self.kind = Some(kind);
        Ok(HEADER_SIZE + len)
    }

    fn complete(&mut self, record: &[u8]) -> Result<DecodedMessage, ProtocolError> {
        let (header, kind) = match (self.header.take(), self.kind.take()) {
            (Some(h), Some(k)) => (h, k),
            _ => self.parse_header(record)?,
        };
        let body = &record[HEADER_SIZE..];
        let message = Message::decode(kind, header.extensions, body)
            .map_err(|source| ProtocolError::MalformedBody {
                message_type: kind.as_str(),
                source,
            })?
            .ok_or(ProtocolError::UnknownMessageType(kind.as_u8()))?;

        let vote_valid = match &message {
            Message::ConfirmAck(vote) => Some(self.verifier.verify(
                &vote.account,
                &vote.signed_payload(),
                &vote.signature,
            )),
            _ => None,
        };

        Ok(DecodedMessage {
            header,
            message,
            vote_valid,
        })
    }
}

/// Per-connection message decoder. Exclusively owned by its connection.
pub type MessageDecoder = FrameReader<MessageFraming>;

impl MessageDecoder {
    pub fn for_network(constants: NetworkConstants, verifier: Arc<dyn SignatureVerifier>) -> Self {
        FrameReader::new(MessageFraming::new(constants, verifier))
    }
}
