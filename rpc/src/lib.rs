//! HTTP status endpoint for the lattice node.
//!
//! - `GET /` reports how many peers completed the node-id handshake
//! - `GET /metrics` exposes the node's Prometheus registry, when one is given

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use handlers::{PeerCountSource, StatusResponse, StatusState};
pub use server::{create_router, StatusServer, StatusServerHandle};
