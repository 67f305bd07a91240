//! Ledger store trait.

use lattice_ledger::StoredBlock;
use lattice_types::{Account, BlockHash};

use crate::StoreError;

/// Block storage keyed by hash, plus the account frontier index that
/// frontier_req responses are served from.
///
/// Each call is its own read or write transaction.
pub trait LedgerStore: Send + Sync {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError>;

    /// Store a block. If its sideband names an account, the account's
    /// frontier moves to `hash` unless the current frontier is at an equal or
    /// greater height.
    fn put(&self, hash: &BlockHash, block: &StoredBlock) -> Result<(), StoreError>;

    fn exists(&self, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.get(hash)?.is_some())
    }

    fn frontier(&self, account: &Account) -> Result<Option<BlockHash>, StoreError>;

    /// Up to `count` `(account, frontier)` pairs in account order, starting at
    /// the first account `>= start`.
    fn frontiers(&self, start: &Account, count: usize) -> Result<Vec<(Account, BlockHash)>, StoreError>;

    fn block_count(&self) -> Result<u64, StoreError>;
}

/// Whether a block at `new_height` should replace a frontier at `current`.
pub fn advances_frontier(current: Option<u64>, new_height: u64) -> bool {
    match current {
        None => true,
        Some(height) => new_height > height,
    }
}
