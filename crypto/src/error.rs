use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("system random source failed: {0}")]
    Random(String),
}
