use lattice_ledger::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message body truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("extension bits select invalid block type {0:#04x}")]
    InvalidBlockType(u8),

    #[error("handshake carries neither query nor response")]
    EmptyHandshake,

    #[error("block codec: {0}")]
    Codec(#[from] CodecError),
}

pub(crate) fn ensure_len(body: &[u8], needed: usize) -> Result<(), MessageError> {
    if body.len() < needed {
        return Err(MessageError::Truncated {
            needed,
            available: body.len(),
        });
    }
    Ok(())
}
