//! Ledger storage for the lattice node.
//!
//! The node reads blocks to serve bootstrap requests and writes blocks it
//! receives through publish or bootstrap. Every backend implements
//! [`LedgerStore`]; the rest of the codebase depends only on the trait.

pub mod error;
pub mod ledger;
pub mod memory;

pub use error::StoreError;
pub use ledger::LedgerStore;
pub use memory::MemoryStore;
