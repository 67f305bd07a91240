//! Cryptographic primitives for the lattice peer node.
//!
//! - **Ed25519 with Blake2b-512** as the internal hash, for block, vote and
//!   handshake signatures
//! - **Blake2b-256** for block hashes
//! - Account and node-id text encoding (`nano_` / `node_` prefixes, base32)
//! - [`SignatureVerifier`], the capability the rest of the node consumes

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod verifier;

pub use address::{decode_account, encode_account, encode_node_id};
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, blake2b_512};
pub use keys::{generate_keypair, keypair_from_private, public_from_private, random_bytes};
pub use sign::{sign_message, verify_signature};
pub use verifier::{Ed25519Verifier, SignatureVerifier};
