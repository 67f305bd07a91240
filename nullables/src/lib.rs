//! Nullable infrastructure for deterministic testing.
//!
//! The node reaches the outside world through a few seams: the clock, the
//! signature-verification capability and the per-peer outbound frame links.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod network;
pub mod verifier;

pub use clock::NullClock;
pub use network::NullNetwork;
pub use verifier::NullVerifier;
