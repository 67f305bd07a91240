//! Lattice peer node.
//!
//! The node is the coordinator that:
//! - Accepts and dials peer connections, one decoder per connection
//! - Proves and checks node identities with the cookie handshake
//! - Feeds confirm_ack votes through the peer registry into the election engine
//! - Requests, answers and vets telemetry
//! - Publishes blocks to its peers in random order
//! - Serves and runs bootstrap sessions (bulk_pull, frontier_req)
//! - Reports everything as typed [`NodeEvent`]s, Prometheus metrics and logs

pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod event;
pub mod handshake;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;
pub mod telemetry;

pub use config::{NodeConfig, RepresentativeWeight, WeightsConfig};
pub use connection::Direction;
pub use context::{NodeContext, Session, DEFAULT_PUBLISH_PEERS};
pub use error::NodeError;
pub use event::NodeEvent;
pub use handshake::{HandshakeOutcome, HandshakeSession};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::LatticeNode;
pub use shutdown::ShutdownController;
