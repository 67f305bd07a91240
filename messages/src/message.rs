//! The typed message enum and per-type body dispatch.

use serde::{Deserialize, Serialize};

use crate::bootstrap::{BulkPull, BulkPullAccount, FrontierReq};
use crate::error::MessageError;
use crate::handshake::NodeIdHandshake;
use crate::header::{Extensions, MessageType};
use crate::keepalive::Keepalive;
use crate::publish::{ConfirmReq, Publish};
use crate::telemetry::TelemetryData;
use crate::vote::Vote;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Keepalive(Keepalive),
    Publish(Publish),
    ConfirmReq(ConfirmReq),
    ConfirmAck(Vote),
    BulkPull(BulkPull),
    BulkPush,
    FrontierReq(FrontierReq),
    NodeIdHandshake(NodeIdHandshake),
    BulkPullAccount(BulkPullAccount),
    TelemetryReq,
    TelemetryAck(TelemetryData),
    /// Ascending-pull payloads are carried opaquely.
    AscPullReq(Vec<u8>),
    AscPullAck(Vec<u8>),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Keepalive(_) => MessageType::Keepalive,
            Self::Publish(_) => MessageType::Publish,
            Self::ConfirmReq(_) => MessageType::ConfirmReq,
            Self::ConfirmAck(_) => MessageType::ConfirmAck,
            Self::BulkPull(_) => MessageType::BulkPull,
            Self::BulkPush => MessageType::BulkPush,
            Self::FrontierReq(_) => MessageType::FrontierReq,
            Self::NodeIdHandshake(_) => MessageType::NodeIdHandshake,
            Self::BulkPullAccount(_) => MessageType::BulkPullAccount,
            Self::TelemetryReq => MessageType::TelemetryReq,
            Self::TelemetryAck(_) => MessageType::TelemetryAck,
            Self::AscPullReq(_) => MessageType::AscPullReq,
            Self::AscPullAck(_) => MessageType::AscPullAck,
        }
    }

    pub fn extensions(&self) -> Extensions {
        match self {
            Self::Publish(m) => m.extensions(),
            Self::ConfirmReq(m) => m.extensions(),
            Self::ConfirmAck(m) => m.extensions(),
            Self::BulkPull(m) => m.extensions(),
            Self::FrontierReq(m) => m.extensions(),
            Self::NodeIdHandshake(m) => m.extensions(),
            Self::TelemetryAck(m) => m.extensions(),
            Self::AscPullReq(payload) | Self::AscPullAck(payload) => {
                Extensions(payload.len() as u16)
            }
            Self::Keepalive(_) | Self::BulkPush | Self::BulkPullAccount(_) | Self::TelemetryReq => {
                Extensions(0)
            }
        }
    }

    pub fn encode_body(&self, out: &mut Vec<u8>) {
        match self {
            Self::Keepalive(m) => m.encode_into(out),
            Self::Publish(m) => m.encode_into(out),
            Self::ConfirmReq(m) => m.encode_into(out),
            Self::ConfirmAck(m) => m.encode_into(out),
            Self::BulkPull(m) => m.encode_into(out),
            Self::FrontierReq(m) => m.encode_into(out),
            Self::NodeIdHandshake(m) => m.encode_into(out),
            Self::BulkPullAccount(m) => m.encode_into(out),
            Self::TelemetryAck(m) => m.encode_into(out),
            Self::AscPullReq(payload) | Self::AscPullAck(payload) => {
                out.extend_from_slice(payload)
            }
            Self::BulkPush | Self::TelemetryReq => {}
        }
    }

    /// Decode a complete body for a known message type.
    ///
    /// Returns `Ok(None)` for the two placeholder types that never carry a message.
    pub fn decode(
        message_type: MessageType,
        extensions: Extensions,
        body: &[u8],
    ) -> Result<Option<Self>, MessageError> {
        let message = match message_type {
            MessageType::Invalid | MessageType::NotAType => return Ok(None),
            MessageType::Keepalive => Self::Keepalive(Keepalive::decode(body)?),
            MessageType::Publish => Self::Publish(Publish::decode(extensions, body)?),
            MessageType::ConfirmReq => Self::ConfirmReq(ConfirmReq::decode(extensions, body)?),
            MessageType::ConfirmAck => Self::ConfirmAck(Vote::decode(extensions, body)?),
            MessageType::BulkPull => Self::BulkPull(BulkPull::decode(extensions, body)?),
            MessageType::BulkPush => Self::BulkPush,
            MessageType::FrontierReq => Self::FrontierReq(FrontierReq::decode(extensions, body)?),
            MessageType::NodeIdHandshake => {
                Self::NodeIdHandshake(NodeIdHandshake::decode(extensions, body)?)
            }
            MessageType::BulkPullAccount => Self::BulkPullAccount(BulkPullAccount::decode(body)?),
            MessageType::TelemetryReq => Self::TelemetryReq,
            MessageType::TelemetryAck => Self::TelemetryAck(TelemetryData::decode(body)?),
            MessageType::AscPullReq => Self::AscPullReq(body.to_vec()),
            MessageType::AscPullAck => Self::AscPullAck(body.to_vec()),
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bodied_messages() {
        for m in [Message::BulkPush, Message::TelemetryReq] {
            let mut body = Vec::new();
            m.encode_body(&mut body);
            assert!(body.is_empty());
            assert_eq!(m.extensions(), Extensions(0));
            assert_eq!(Message::decode(m.message_type(), Extensions(0), &[]), Ok(Some(m)));
        }
    }

    #[test]
    fn asc_pull_extensions_carry_length() {
        let m = Message::AscPullReq(vec![1, 2, 3]);
        assert_eq!(m.extensions(), Extensions(3));
    }
}
