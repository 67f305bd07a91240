use lattice_types::Account;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Votes must be filtered against the weight table before they reach the engine.
    #[error("representative {0} has no voting weight")]
    UnknownRepresentative(Account),

    #[error("invalid weight table: {0}")]
    InvalidWeights(String),
}
