//! LMDB ledger store for the lattice node.
//!
//! Implements [`lattice_store::LedgerStore`] using the `heed` LMDB bindings.
//! One environment holds two databases, `blocks` and `frontiers`.

pub mod environment;
pub mod error;
pub mod ledger;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use ledger::LmdbStore;
