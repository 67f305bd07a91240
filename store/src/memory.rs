//! In-memory ledger store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lattice_ledger::StoredBlock;
use lattice_types::{Account, BlockHash};

use crate::ledger::{advances_frontier, LedgerStore};
use crate::StoreError;

#[derive(Debug, Default)]
struct Inner {
    blocks: BTreeMap<BlockHash, StoredBlock>,
    frontiers: BTreeMap<Account, BlockHash>,
}

/// `LedgerStore` over two ordered maps. Used when no ledger path is set and
/// throughout the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.read()?.blocks.get(hash).cloned())
    }

    fn put(&self, hash: &BlockHash, block: &StoredBlock) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let account = block.sideband.account;
        if !account.is_zero() {
            let current = inner
                .frontiers
                .get(&account)
                .and_then(|head| inner.blocks.get(head))
                .map(|head| head.sideband.height);
            if advances_frontier(current, block.sideband.height) {
                inner.frontiers.insert(account, *hash);
            }
        }
        inner.blocks.insert(*hash, block.clone());
        Ok(())
    }

    fn frontier(&self, account: &Account) -> Result<Option<BlockHash>, StoreError> {
        Ok(self.read()?.frontiers.get(account).copied())
    }

    fn frontiers(&self, start: &Account, count: usize) -> Result<Vec<(Account, BlockHash)>, StoreError> {
        Ok(self
            .read()?
            .frontiers
            .range(*start..)
            .take(count)
            .map(|(account, head)| (*account, *head))
            .collect())
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.blocks.len() as u64)
    }
}
