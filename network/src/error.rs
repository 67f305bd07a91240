use lattice_messages::PeerEndpoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("peer {0} not found")]
    PeerNotFound(PeerEndpoint),

    #[error("consensus error: {0}")]
    Consensus(#[from] lattice_consensus::ConsensusError),
}
