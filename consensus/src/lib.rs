//! Election engine for block-lattice consensus.
//!
//! Representatives vote for block hashes. Votes are tallied per hash in one
//! of two phases:
//!
//! - **Inactive**: only principal representatives (at least 0.1% of trended
//!   weight) may open or add to a tally.
//! - **Active**: once an inactive tally has enough unique voters and at least
//!   10% of trended weight it is promoted; it confirms, exactly once, when its
//!   weight reaches 67% of trended weight.
//!
//! ## Module overview
//!
//! - [`weights`]: weight table and derived thresholds.
//! - [`election`]: per-hash state, one tagged entry per hash.
//! - [`engine`]: vote routing, promotion and confirmation.
//! - [`config`]: promotion voter minimum and active-vote policy.

pub mod config;
pub mod election;
pub mod engine;
pub mod error;
pub mod weights;

pub use config::{ActiveVotePolicy, ElectionConfig, DEFAULT_MIN_PROMOTION_VOTERS};
pub use election::{Election, ElectionEntry, ElectionState, ElectionSummary, InactiveElection};
pub use engine::{ElectionEngine, IgnoreReason, VoteOutcome};
pub use error::ConsensusError;
pub use weights::{WeightTable, REFERENCE_TRENDED};
