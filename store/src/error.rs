use lattice_ledger::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("stored record does not decode: {0}")]
    Codec(#[from] CodecError),
}
