// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Caller-facing entry points for one repository.
//!
//! ```text
//!  create / retire / sync / backup / load / auto-backup
//!        |
//!        v
//!   enabled? (git config agb.enabled) ──no──► Disabled
//!        |
//!   state.try_lock() ──busy──► OperationInProgress
//!        |
//!   RepoLock <git-dir>/agb.lock ──exists──► OperationInProgress
//!        |
//!        v
//!   BackupOrchestrator { vcs, store, config, cancel }
//! ```
//!
//! `status`, `records` and `should_auto_backup` only read, so they wait for
//! the state lock instead of failing and skip the lock file.
//!
//! `reload_config` swaps the configuration under the same lock, so no
//! operation ever sees two configurations.


use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lock::RepoLock;
use super::orchestrator::{BackupOrchestrator, BackupReport, BranchStatus};
use super::prompt::Prompter;
use super::store::{BranchInfoStore, RecordMap};
use super::BackupRecord;
use crate::config::{Config, ConfigChange};
use crate::error::{AgbResult, Precondition};
use crate::git::{GitRepo, Vcs};

/// Git config key holding the enabled flag.
pub const ENABLED_KEY: &str = "agb.enabled";

struct SessionState {
    config: Config,
    store: BranchInfoStore,
}

/// Held for the duration of one mutating operation.
struct Operation<'a> {
    state: MutexGuard<'a, SessionState>,
    _file_lock: Option<RepoLock>,
}

/// Explicit context threaded through every workflow.
pub struct Session<V: Vcs> {
    vcs: V,
    state: Mutex<SessionState>,
    store_root: Option<PathBuf>,
    lock_dir: Option<PathBuf>,
    cancel: CancellationToken,
}

impl Session<GitRepo> {
    /// Session on an on-disk repository, storing records under its work
    /// tree and locking in its git directory.
    #[must_use]
    pub fn open(repo: GitRepo, config: Config) -> Self {
        let root = repo.root().to_path_buf();
        let store = BranchInfoStore::for_config(&config.branch_info, &root);
        let lock_dir = repo.git_dir().to_path_buf();
        Self::new(repo, config, store)
            .with_store_root(root)
            .with_lock_dir(lock_dir)
    }
}

fn parse_git_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "no" | "off" | "0" | ""
    )
}

impl<V: Vcs> Session<V> {
    #[must_use]
    pub fn new(vcs: V, config: Config, store: BranchInfoStore) -> Self {
        Self {
            vcs,
            state: Mutex::new(SessionState { config, store }),
            store_root: None,
            lock_dir: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Rebuild the store under `root` when persistence is toggled on reload.
    #[must_use]
    pub fn with_store_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store_root = Some(root.into());
        self
    }

    /// Take a lock file in `dir` for every mutating operation.
    #[must_use]
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub const fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.state().config.clone()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- enabled flag ---

    /// Unset means enabled.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the repository config cannot be read.
    pub fn is_enabled(&self) -> AgbResult<bool> {
        Ok(self
            .vcs
            .get_config(ENABLED_KEY)?
            .is_none_or(|value| parse_git_bool(&value)))
    }

    /// # Errors
    ///
    /// Returns a `GitError` if the repository config cannot be written.
    pub fn set_enabled(&self, enabled: bool) -> AgbResult<()> {
        self.vcs
            .set_config(ENABLED_KEY, if enabled { "true" } else { "false" })?;
        info!(enabled, "Active git backup toggled");
        Ok(())
    }

    /// `branch`, or the checked-out branch.
    ///
    /// # Errors
    ///
    /// `DetachedHead` when no branch is given and HEAD is detached.
    pub fn working_branch(&self, branch: Option<&str>) -> AgbResult<String> {
        if let Some(branch) = branch {
            return Ok(branch.to_string());
        }
        self.vcs
            .current_branch()?
            .ok_or_else(|| Precondition::DetachedHead.into())
    }

    fn begin(&self) -> AgbResult<Operation<'_>> {
        if !self.is_enabled()? {
            return Err(Precondition::Disabled.into());
        }
        let state = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(Precondition::OperationInProgress {
                    holder: "another operation in this process".to_string(),
                }
                .into());
            }
        };
        let file_lock = self
            .lock_dir
            .as_deref()
            .map(RepoLock::acquire)
            .transpose()?;
        Ok(Operation {
            state,
            _file_lock: file_lock,
        })
    }

    fn run<T>(&self, f: impl FnOnce(&BackupOrchestrator<'_>) -> AgbResult<T>) -> AgbResult<T> {
        let op = self.begin()?;
        let orchestrator =
            BackupOrchestrator::new(&self.vcs, &op.state.store, &op.state.config, &self.cancel);
        f(&orchestrator)
    }

    fn inspect<T>(&self, f: impl FnOnce(&BackupOrchestrator<'_>) -> AgbResult<T>) -> AgbResult<T> {
        let state = self.state();
        let orchestrator =
            BackupOrchestrator::new(&self.vcs, &state.store, &state.config, &self.cancel);
        f(&orchestrator)
    }

    // --- workflows ---

    /// # Errors
    ///
    /// See [`BackupOrchestrator::create_backup_branch`].
    pub fn create(&self, branch: Option<&str>, name: Option<&str>) -> AgbResult<String> {
        self.run(|o| {
            let working = self.working_branch(branch)?;
            o.create_backup_branch(&working, name)
        })
    }

    /// # Errors
    ///
    /// See [`BackupOrchestrator::retire_backup_branch`].
    pub fn retire(&self, branch: Option<&str>) -> AgbResult<BackupRecord> {
        self.run(|o| o.retire_backup_branch(&self.working_branch(branch)?))
    }

    /// # Errors
    ///
    /// See [`BackupOrchestrator::sync_backup_branch`].
    pub fn sync(&self, branch: Option<&str>) -> AgbResult<String> {
        self.run(|o| o.sync_backup_branch(&self.working_branch(branch)?))
    }

    /// Back up the checked-out branch.
    ///
    /// # Errors
    ///
    /// See [`BackupOrchestrator::backup`].
    pub fn backup(&self) -> AgbResult<BackupReport> {
        self.run(|o| o.backup(&self.working_branch(None)?))
    }

    /// Back up the checked-out branch if its record asks for it.
    ///
    /// # Errors
    ///
    /// See [`BackupOrchestrator::backup`].
    pub fn on_save(&self) -> AgbResult<Option<BackupReport>> {
        if !self.should_auto_backup(None)? {
            debug!("Auto backup off for this branch");
            return Ok(None);
        }
        self.backup().map(Some)
    }

    /// Restore the latest snapshot onto the checked-out branch.
    ///
    /// # Errors
    ///
    /// See [`BackupOrchestrator::load_backup`].
    pub fn load(&self, unsaved_documents: bool, prompter: &dyn Prompter) -> AgbResult<bool> {
        self.run(|o| o.load_backup(&self.working_branch(None)?, unsaved_documents, prompter))
    }

    /// # Errors
    ///
    /// `NotLinked` or a storage error.
    pub fn set_auto_backup(&self, branch: Option<&str>, flag: bool) -> AgbResult<()> {
        self.run(|o| o.set_auto_backup(&self.working_branch(branch)?, flag))
    }

    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn set_auto_backup_for_all(&self, flag: bool) -> AgbResult<usize> {
        self.run(|o| o.set_auto_backup_for_all(flag))
    }

    // --- queries ---

    /// # Errors
    ///
    /// Returns an error if the branches cannot be compared.
    pub fn status(&self, branch: Option<&str>) -> AgbResult<BranchStatus> {
        self.inspect(|o| o.status(&self.working_branch(branch)?))
    }

    /// False whenever the session is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the enabled flag or the branch cannot be read.
    pub fn should_auto_backup(&self, branch: Option<&str>) -> AgbResult<bool> {
        if !self.is_enabled()? {
            return Ok(false);
        }
        self.inspect(|o| Ok(o.should_auto_backup(&self.working_branch(branch)?)))
    }

    #[must_use]
    pub fn records(&self) -> RecordMap {
        let state = self.state();
        state.store.get_all(&state.config.branch_info.path)
    }

    // --- configuration ---

    /// Replace the configuration and return what changed.
    ///
    /// When the default auto-backup flag changed and records exist, the
    /// prompter decides whether every record adopts the new value.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the bulk update cannot be persisted.
    pub fn reload_config(&self, new: Config, prompter: &dyn Prompter) -> AgbResult<Vec<ConfigChange>> {
        let mut state = self.state();
        let changes = state.config.diff(&new);
        if changes.is_empty() {
            return Ok(changes);
        }

        if state.config.branch_info.persist != new.branch_info.persist
            && let Some(root) = &self.store_root
        {
            debug!(persist = new.branch_info.persist, "Switching branch info storage");
            state.store = BranchInfoStore::for_config(&new.branch_info, root);
        }
        state.config = new;
        info!(?changes, "Configuration reloaded");

        let flag = changes.iter().find_map(|change| match change {
            ConfigChange::DefaultAutoBackup(flag) => Some(*flag),
            _ => None,
        });
        if let Some(flag) = flag {
            let path = state.config.branch_info.path.clone();
            let count = state.store.get_all(&path).len();
            let question = format!(
                "Default auto backup is now {}. Apply to all {count} backup branches?",
                if flag { "on" } else { "off" }
            );
            if count > 0 && prompter.confirm(&question) {
                state.store.set_auto_backup_for_all(&path, flag)?;
            }
        }
        Ok(changes)
    }
}
