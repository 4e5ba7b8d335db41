// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cross-process lock on a repository.
//!
//! `<git-dir>/agb.lock` is created exclusively and holds the owner's pid.
//! It is removed when the [`RepoLock`] is dropped. A crashed process leaves
//! the file behind; deleting it by hand releases the lock.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AgbResult, Precondition};

pub const LOCK_FILE_NAME: &str = "agb.lock";

#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
}

impl RepoLock {
    /// Take the lock in `git_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::OperationInProgress` if another process holds
    /// the lock, or an I/O error if the file cannot be created.
    pub fn acquire(git_dir: &Path) -> AgbResult<Self> {
        let path = git_dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    warn!(path = %path.display(), error = %e, "Failed to record lock owner");
                }
                debug!(path = %path.display(), "Acquired repository lock");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let owner = std::fs::read_to_string(&path).unwrap_or_default();
                let owner = owner.trim();
                let holder = if owner.is_empty() {
                    format!("lock file {}", path.display())
                } else {
                    format!("pid {owner}, lock file {}", path.display())
                };
                Err(Precondition::OperationInProgress { holder }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove repository lock");
        }
    }
}
