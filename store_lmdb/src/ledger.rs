//! LMDB implementation of LedgerStore.
//!
//! `blocks` maps a 32-byte hash to the stored record (`tag ‖ body ‖
//! sideband`); `frontiers` maps a 32-byte account to its head hash. Keys
//! are raw bytes, so LMDB's lexicographic order is account order.

use std::ops::Bound;
use std::path::Path;

use lattice_ledger::StoredBlock;
use lattice_store::ledger::advances_frontier;
use lattice_store::{LedgerStore, StoreError};
use lattice_types::{Account, BlockHash, PublicKey};

use crate::environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
use crate::LmdbError;

pub struct LmdbStore {
    env: LmdbEnvironment,
}

impl LmdbStore {
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self {
            env: LmdbEnvironment::open(path, map_size)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.env.path()
    }
}

fn hash_from(bytes: &[u8]) -> Result<BlockHash, LmdbError> {
    BlockHash::from_slice(bytes)
        .ok_or_else(|| LmdbError::Serialization("invalid block hash length".into()))
}

fn account_from(bytes: &[u8]) -> Result<Account, LmdbError> {
    PublicKey::from_slice(bytes)
        .ok_or_else(|| LmdbError::Serialization("invalid account length".into()))
}

impl LedgerStore for LmdbStore {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self
            .env
            .blocks_db
            .get(&rtxn, hash.as_bytes().as_slice())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        Ok(Some(StoredBlock::decode(bytes)?))
    }

    fn put(&self, hash: &BlockHash, block: &StoredBlock) -> Result<(), StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;
        let account = block.sideband.account;

        if !account.is_zero() {
            let head = self
                .env
                .frontiers_db
                .get(&wtxn, account.as_bytes().as_slice())
                .map_err(LmdbError::from)?
                .map(hash_from)
                .transpose()?;
            let current = match head {
                Some(head) => self
                    .env
                    .blocks_db
                    .get(&wtxn, head.as_bytes().as_slice())
                    .map_err(LmdbError::from)?
                    .map(StoredBlock::decode)
                    .transpose()?
                    .map(|stored| stored.sideband.height),
                None => None,
            };
            if advances_frontier(current, block.sideband.height) {
                self.env
                    .frontiers_db
                    .put(&mut wtxn, account.as_bytes().as_slice(), hash.as_bytes().as_slice())
                    .map_err(LmdbError::from)?;
            }
        }

        self.env
            .blocks_db
            .put(&mut wtxn, hash.as_bytes().as_slice(), block.encode().as_slice())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn frontier(&self, account: &Account) -> Result<Option<BlockHash>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let head = self
            .env
            .frontiers_db
            .get(&rtxn, account.as_bytes().as_slice())
            .map_err(LmdbError::from)?
            .map(hash_from)
            .transpose()?;
        Ok(head)
    }

    fn frontiers(&self, start: &Account, count: usize) -> Result<Vec<(Account, BlockHash)>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let range = (Bound::Included(start.as_bytes().as_slice()), Bound::Unbounded);
        let iter = self
            .env
            .frontiers_db
            .range(&rtxn, &range)
            .map_err(LmdbError::from)?;

        let mut frontiers = Vec::new();
        for result in iter.take(count) {
            let (key, val) = result.map_err(LmdbError::from)?;
            frontiers.push((account_from(key)?, hash_from(val)?));
        }
        Ok(frontiers)
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let count = self.env.blocks_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
