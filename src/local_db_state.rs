//! LMDB-backed slot storage.
//!
//! The environment lives in a `<name>.lmdb` directory and holds a single
//! unnamed database. Keys are slot names, values are the UTF-8 JSON bytes of
//! a store's collection.
//!
//! LMDB forbids opening the same environment twice in one process, so every
//! open directory is claimed in a process-wide registry until it is closed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};

use crate::error::StoreError;
use crate::storage::SlotStorage;

pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

static OPEN_PATHS: Mutex<BTreeSet<PathBuf>> = parking_lot::const_mutex(BTreeSet::new());

/// Claim on an environment directory, released on drop.
struct PathClaim(PathBuf);

impl PathClaim {
    fn acquire(dir: &Path) -> Result<Self, StoreError> {
        let key = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !OPEN_PATHS.lock().insert(key.clone()) {
            return Err(StoreError::AlreadyOpen(key.display().to_string()));
        }
        Ok(Self(key))
    }
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        OPEN_PATHS.lock().remove(&self.0);
    }
}

// Field order matters: the environment must be dropped before the claim.
struct OpenEnv {
    env: Environment,
    db: Database,
    _claim: PathClaim,
}

pub struct AppDbState {
    name: String,
    inner: RwLock<Option<OpenEnv>>,
}

impl AppDbState {
    pub fn init(name: String) -> Result<Self, StoreError> {
        Self::init_with_map_size(name, DEFAULT_MAP_SIZE)
    }

    /// Opens `<name>.lmdb`. Fails with [`StoreError::AlreadyOpen`] while
    /// another handle in this process still holds the same directory.
    pub fn init_with_map_size(name: String, map_size: usize) -> Result<Self, StoreError> {
        let dir = db_dir(&name);
        let opened = open_env(&dir, map_size)?;
        info!("LMDB environment opened at {}", dir.display());
        Ok(Self {
            name,
            inner: RwLock::new(Some(opened)),
        })
    }

    /// Syncs and releases the environment. Later slot operations fail with
    /// [`StoreError::Closed`]. Closing twice is not an error.
    pub fn close_database(&self) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        if let Some(open) = guard.take() {
            open.env.sync(true)?;
            info!("LMDB environment {} closed", self.name);
        } else {
            debug!("LMDB environment {} already closed", self.name);
        }
        Ok(())
    }
}

impl SlotStorage for AppDbState {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.inner.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;
        let txn = open.env.begin_ro_txn()?;
        let value = match txn.get(open.db, &slot) {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(StoreError::read(slot, e)),
        };
        txn.abort();
        Ok(value)
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let guard = self.inner.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;
        let mut txn = open.env.begin_rw_txn()?;
        txn.put(open.db, &slot, &bytes, WriteFlags::empty())
            .map_err(|e| StoreError::write(slot, e))?;
        txn.commit().map_err(|e| StoreError::write(slot, e))?;
        Ok(())
    }

    fn remove_slot(&self, slot: &str) -> Result<bool, StoreError> {
        let guard = self.inner.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;
        let mut txn = open.env.begin_rw_txn()?;
        let existed = match txn.del(open.db, &slot, None) {
            Ok(()) => true,
            Err(lmdb::Error::NotFound) => false,
            Err(e) => return Err(StoreError::Lmdb(e)),
        };
        txn.commit()?;
        Ok(existed)
    }
}

fn db_dir(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.lmdb"))
}

fn open_env(dir: &Path, map_size: usize) -> Result<OpenEnv, StoreError> {
    std::fs::create_dir_all(dir)?;
    let claim = PathClaim::acquire(dir)?;
    let env = Environment::new().set_map_size(map_size).open(dir)?;
    let db = env.create_db(None, DatabaseFlags::empty())?;
    Ok(OpenEnv {
        env,
        db,
        _claim: claim,
    })
}
