//! Fundamental types for the lattice peer node.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! block hashes, keys and accounts, raw amounts, timestamps, and per-network constants.

pub mod amount;
pub mod block;
pub mod error;
pub mod keys;
pub mod network;
pub mod time;

pub use amount::Amount;
pub use block::BlockHash;
pub use error::TypesError;
pub use keys::{Account, KeyPair, PrivateKey, PublicKey, Signature};
pub use network::{NetworkConstants, NetworkId, ProtocolVersion};
pub use time::{Clock, SystemClock, Timestamp};
