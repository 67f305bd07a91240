use lattice_ledger::CodecError;
use lattice_messages::MessageError;
use thiserror::Error;

/// Every error here is fatal to the connection that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("bad magic byte {0:#04x}")]
    BadMagic(u8),

    #[error("message for network {got:#04x}, expected {expected:#04x}")]
    WrongNetwork { expected: u8, got: u8 },

    #[error("unknown message type {0:#04x}")]
    UnknownMessageType(u8),

    #[error("invalid block type tag {0:#04x}")]
    InvalidBlockType(u8),

    #[error("malformed {message_type} body: {source}")]
    MalformedBody {
        message_type: &'static str,
        source: MessageError,
    },

    #[error("block codec: {0}")]
    Codec(#[from] CodecError),

    #[error("reader already failed; connection must be closed")]
    Closed,
}
