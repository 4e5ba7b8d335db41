// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! [`RecordStorage`] backends.
//!
//! File format (four-space indented JSON, keys sorted):
//!
//! ```text
//! {
//!     "feature-1": {
//!         "autoBackup": true,
//!         "backupBranchName": "agb-backup-feature-1"
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::{RecordMap, RecordStorage};
use crate::error::StorageError;

/// Records kept in a JSON file relative to the work tree root.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn write_error(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

impl RecordStorage for JsonFileStorage {
    fn load(&self, path: &Path) -> Result<RecordMap, StorageError> {
        let file = self.resolve(path);
        let content = match std::fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: file.display().to_string(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        serde_json::from_str(&content).map_err(|source| StorageError::Serialize {
            path: file.display().to_string(),
            source,
        })
    }

    fn save(&self, path: &Path, records: &RecordMap) -> Result<(), StorageError> {
        let file = self.resolve(path);
        let dir = file
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        std::fs::create_dir_all(&dir).map_err(|e| Self::write_error(&dir, e))?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records
            .serialize(&mut serializer)
            .map_err(|source| StorageError::Serialize {
                path: file.display().to_string(),
                source,
            })?;
        buf.push(b'\n');

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| Self::write_error(&file, e))?;
        temp.write_all(&buf)
            .map_err(|e| Self::write_error(&file, e))?;
        temp.persist(&file)
            .map_err(|e| Self::write_error(&file, e.error))?;
        Ok(())
    }
}

/// Records kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, RecordMap>>,
}

impl RecordStorage for MemoryStorage {
    fn load(&self, path: &Path) -> Result<RecordMap, StorageError> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(files.get(path).cloned().unwrap_or_default())
    }

    fn save(&self, path: &Path, records: &RecordMap) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.insert(path.to_path_buf(), records.clone());
        Ok(())
    }
}
