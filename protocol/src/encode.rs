//! Message encoding: header followed by body.

use lattice_messages::{Message, MessageHeader, HEADER_SIZE};
use lattice_types::NetworkConstants;

/// Encode a message for the given network.
pub fn encode_message(constants: &NetworkConstants, message: &Message) -> Vec<u8> {
    let header = MessageHeader::new(constants, message.message_type(), message.extensions());
    let mut out = Vec::with_capacity(HEADER_SIZE + 256);
    out.extend_from_slice(&header.to_bytes());
    message.encode_body(&mut out);
    out
}

/// Encodes messages for one network without repeating the constants.
#[derive(Clone, Debug)]
pub struct MessageEncoder {
    constants: NetworkConstants,
}

impl MessageEncoder {
    pub fn new(constants: NetworkConstants) -> Self {
        Self { constants }
    }

    pub fn encode(&self, message: &Message) -> Vec<u8> {
        encode_message(&self.constants, message)
    }

    pub fn constants(&self) -> &NetworkConstants {
        &self.constants
    }
}
