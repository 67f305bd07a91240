//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::LmdbError;

/// Default map size: 16 GiB of address space, grown into lazily by LMDB.
pub const DEFAULT_MAP_SIZE: usize = 16 * 1024 * 1024 * 1024;
const MAX_DBS: u32 = 8;

/// The environment plus the two ledger databases.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) blocks_db: Database<Bytes, Bytes>,
    pub(crate) frontiers_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an environment at `path`, creating the directory and
    /// the `blocks` and `frontiers` databases as needed.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never accessed outside heed's transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let blocks_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("blocks"))?;
        let frontiers_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("frontiers"))?;
        wtxn.commit()?;

        info!(path = %path.display(), "ledger opened");
        Ok(Self {
            env: Arc::new(env),
            blocks_db,
            frontiers_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
