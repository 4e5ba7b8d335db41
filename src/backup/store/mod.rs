// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cached branch-info records.
//!
//! ```text
//! get_all(path) ──┐
//! get / set ──────┤  lock ──► ensure_current(path) ──► mutate ──► save
//! delete ─────────┤                 │
//! set_auto_all ───┘      cache.path == path ? hit
//!                                   : storage.load(path) (errors → empty)
//! ```
//!
//! # Staleness
//!
//! The cache holds one `{path, records}` entry. A path is loaded once and
//! then served from memory until a different path is requested; edits made
//! to the file by other processes in the meantime are not observed.
//!
//! A failed `save` leaves the cache holding the attempted state.

mod storage;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::BackupRecord;
use crate::config::types::BranchInfoConfig;
use crate::error::StorageError;

pub use storage::{JsonFileStorage, MemoryStorage};

/// Working-branch name to record.
pub type RecordMap = BTreeMap<String, BackupRecord>;

/// Persistence collaborator for [`BranchInfoStore`].
pub trait RecordStorage: Send + Sync {
    /// Read every record stored at `path`. A missing file is an empty map.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the content exists but cannot be read or
    /// parsed.
    fn load(&self, path: &Path) -> Result<RecordMap, StorageError>;

    /// Replace everything stored at `path` with `records`.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the content cannot be written.
    fn save(&self, path: &Path, records: &RecordMap) -> Result<(), StorageError>;
}

struct CacheEntry {
    path: PathBuf,
    records: RecordMap,
}

/// Size-1 cache in front of a [`RecordStorage`].
///
/// Every operation holds the cache lock for its whole read-modify-write,
/// so concurrent `set` calls for different branches never lose each other.
pub struct BranchInfoStore {
    storage: Box<dyn RecordStorage>,
    cache: Mutex<Option<CacheEntry>>,
}

impl std::fmt::Debug for BranchInfoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.lock().as_ref().map(|entry| entry.path.clone());
        f.debug_struct("BranchInfoStore")
            .field("cached_path", &cached)
            .finish_non_exhaustive()
    }
}

impl BranchInfoStore {
    #[must_use]
    pub fn new(storage: impl RecordStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            cache: Mutex::new(None),
        }
    }

    /// Store backed by process memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }

    /// JSON file under `root` when persistence is on, memory otherwise.
    #[must_use]
    pub fn for_config(branch_info: &BranchInfoConfig, root: &Path) -> Self {
        if branch_info.persist {
            Self::new(JsonFileStorage::new(root))
        } else {
            Self::in_memory()
        }
    }

    /// All records for `path`.
    pub fn get_all(&self, path: &Path) -> RecordMap {
        let mut cache = self.lock();
        self.ensure_current(&mut cache, path).clone()
    }

    pub fn get(&self, path: &Path, branch: &str) -> Option<BackupRecord> {
        let mut cache = self.lock();
        self.ensure_current(&mut cache, path).get(branch).cloned()
    }

    /// Insert or overwrite the record for `branch` and persist.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if persisting fails. The cache keeps the new
    /// record either way.
    pub fn set(&self, path: &Path, branch: &str, record: BackupRecord) -> Result<(), StorageError> {
        let mut cache = self.lock();
        let records = self.ensure_current(&mut cache, path);
        records.insert(branch.to_string(), record);
        debug!(branch, path = %path.display(), "Recording backup branch info");
        self.storage.save(path, records)
    }

    /// Remove the record for `branch` and persist. Returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if persisting fails.
    pub fn delete(&self, path: &Path, branch: &str) -> Result<Option<BackupRecord>, StorageError> {
        let mut cache = self.lock();
        let records = self.ensure_current(&mut cache, path);
        let Some(removed) = records.remove(branch) else {
            return Ok(None);
        };
        debug!(branch, path = %path.display(), "Removing backup branch info");
        self.storage.save(path, records)?;
        Ok(Some(removed))
    }

    /// Set `auto_backup` on every record with a single write.
    /// Returns the number of records.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if persisting fails.
    pub fn set_auto_backup_for_all(&self, path: &Path, flag: bool) -> Result<usize, StorageError> {
        let mut cache = self.lock();
        let records = self.ensure_current(&mut cache, path);
        for record in records.values_mut() {
            record.auto_backup = flag;
        }
        let count = records.len();
        self.storage.save(path, records)?;
        Ok(count)
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_current<'a>(
        &self,
        cache: &'a mut Option<CacheEntry>,
        path: &Path,
    ) -> &'a mut RecordMap {
        let stale = cache.as_ref().is_none_or(|entry| entry.path != path);
        if stale {
            let records = self.storage.load(path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Branch info unreadable, starting empty");
                RecordMap::new()
            });
            *cache = Some(CacheEntry {
                path: path.to_path_buf(),
                records,
            });
        }
        &mut cache.get_or_insert_with(|| CacheEntry {
            path: path.to_path_buf(),
            records: RecordMap::new(),
        })
        .records
    }
}
