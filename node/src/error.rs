use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("protocol error: {0}")]
    Protocol(#[from] lattice_protocol::ProtocolError),

    #[error("consensus error: {0}")]
    Consensus(#[from] lattice_consensus::ConsensusError),

    #[error("network error: {0}")]
    Network(#[from] lattice_network::NetworkError),

    #[error("store error: {0}")]
    Store(#[from] lattice_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] lattice_store_lmdb::LmdbError),

    #[error("crypto error: {0}")]
    Crypto(#[from] lattice_crypto::CryptoError),

    #[error("status endpoint error: {0}")]
    Rpc(#[from] lattice_rpc::RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid handshake: {0}")]
    InvalidHandshake(String),

    #[error("peer limit reached, refusing {0}")]
    PeerLimit(String),

    #[error("connection closed before the stream ended")]
    StreamClosed,
}
