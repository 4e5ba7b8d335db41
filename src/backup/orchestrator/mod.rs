// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup workflows as ordered chains of VCS calls.
//!
//! # backup
//!
//! ```text
//! unstage ─► [sync if stale] ─► checkout B ──fail──► CheckoutConflict
//!                                   │
//!                      add . ─► commit ──fail──► unstage ───────┐
//!                                   │                           │
//!                       push --force ──fail──► undo snapshot ───┤
//!                                   │                           │
//!                        reset --mixed HEAD~1                   │
//!                                   │                           │
//!                           checkout W ◄────────────────────────┘
//! ```
//!
//! # load
//!
//! ```text
//! [stash] ─► checkout B ─► fetch ─► reset --hard <remote>/B
//!                                        │
//!                          W..B == (0, 1) ? ──no──► checkout W ─► confirm?
//!                                        │                  no ◄─┘  │ yes
//!                                        │                 false    ▼
//!                                        │◄──────────────────── checkout B
//!                          reset --mixed HEAD~1 ─► checkout W ─► true
//! ```
//!
//! Once a workflow has left the working branch every exit path tries to
//! check it out again.


use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::prompt::Prompter;
use super::store::BranchInfoStore;
use super::verify::SyncVerifier;
use super::BackupRecord;
use crate::config::Config;
use crate::error::{AgbError, AgbResult, BackupError, GitError, Precondition, Step};
use crate::git::{DivergenceReport, ResetMode, Vcs};

/// Outcome of a successful `backup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub working: String,
    pub backup: String,
    pub remote: String,
    /// Identifier embedded in the snapshot commit message.
    pub snapshot_id: String,
}

/// Conceptual state of a working branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    NoBackup,
    /// Record exists but there is nothing on the remote to compare with.
    BackupLinked,
    /// Local backup mirrors the working tip, remote is one snapshot ahead.
    BackupInSync,
    BackupDiverged,
}

impl fmt::Display for BackupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoBackup => "no backup",
            Self::BackupLinked => "linked",
            Self::BackupInSync => "in sync",
            Self::BackupDiverged => "diverged",
        })
    }
}

/// What `status` found for one working branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatus {
    pub working: String,
    pub record: Option<BackupRecord>,
    pub local_exists: bool,
    /// Working branch against the local backup branch.
    pub local: Option<DivergenceReport>,
    /// Local backup branch against `<remote>/<backup>`.
    pub remote: Option<DivergenceReport>,
}

impl BranchStatus {
    #[must_use]
    pub fn state(&self) -> BackupState {
        match (&self.record, self.local, self.remote) {
            (None, _, _) => BackupState::NoBackup,
            (Some(_), Some(local), Some(remote)) => {
                if local.is_identical() && remote == DivergenceReport::new(0, 1) {
                    BackupState::BackupInSync
                } else {
                    BackupState::BackupDiverged
                }
            }
            (Some(_), Some(local), None) if !local.is_identical() => BackupState::BackupDiverged,
            (Some(_), _, _) => BackupState::BackupLinked,
        }
    }
}

/// Runs one workflow against one repository.
///
/// Holds only borrowed state; construct one per call.
pub struct BackupOrchestrator<'a> {
    vcs: &'a dyn Vcs,
    store: &'a BranchInfoStore,
    config: &'a Config,
    cancel: &'a CancellationToken,
}

fn step_failed(step: Step) -> impl FnOnce(GitError) -> AgbError {
    move |source| BackupError::StepFailed { step, source }.into()
}

fn partial(completed: Step, failed: Step, source: impl Into<AgbError>) -> AgbError {
    BackupError::PartialFailure {
        completed,
        failed,
        source: Box::new(source.into()),
    }
    .into()
}

impl<'a> BackupOrchestrator<'a> {
    #[must_use]
    pub const fn new(
        vcs: &'a dyn Vcs,
        store: &'a BranchInfoStore,
        config: &'a Config,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            vcs,
            store,
            config,
            cancel,
        }
    }

    fn verifier(&self) -> SyncVerifier<'a> {
        SyncVerifier::new(self.vcs)
    }

    fn checkpoint(&self, step: Step) -> AgbResult<()> {
        if self.cancel.is_cancelled() {
            warn!(%step, "Cancelled");
            return Err(BackupError::Cancelled { step }.into());
        }
        Ok(())
    }

    fn linked(&self, working: &str) -> AgbResult<BackupRecord> {
        self.store
            .get(&self.config.branch_info.path, working)
            .ok_or_else(|| {
                Precondition::NotLinked {
                    branch: working.to_string(),
                }
                .into()
            })
    }

    fn require_checked_out(&self, working: &str) -> AgbResult<()> {
        if self.vcs.current_branch()?.as_deref() == Some(working) {
            Ok(())
        } else {
            Err(Precondition::NotCheckedOut {
                branch: working.to_string(),
            }
            .into())
        }
    }

    fn return_to(&self, working: &str) {
        if let Err(e) = self.vcs.checkout(working) {
            error!(branch = working, error = %e, "Could not return to working branch");
        }
    }

    /// Drop a record written by a workflow that then failed. The cache is
    /// cleared even when the write fails.
    fn forget(&self, working: &str) {
        if let Err(e) = self.store.delete(&self.config.branch_info.path, working) {
            warn!(error = %e, "Failed to remove branch info after error");
        }
    }

    fn unstage(&self) {
        if let Err(e) = self.vcs.unstage_all() {
            warn!(error = %e, "Failed to reset staged changes");
        }
    }

    // --- create / retire / sync ---

    /// Link `working` to a new backup branch and return its name.
    ///
    /// # Errors
    ///
    /// `AlreadyLinked`, `InvalidBranchName` and `NameCollision` before any
    /// mutation; `StepFailed` or `PartialFailure` afterwards. Completed steps
    /// are compensated where possible.
    pub fn create_backup_branch(&self, working: &str, desired: Option<&str>) -> AgbResult<String> {
        let info_path = &self.config.branch_info.path;
        let records = self.store.get_all(info_path);
        if let Some(existing) = records.get(working) {
            return Err(Precondition::AlreadyLinked {
                branch: working.to_string(),
                backup: existing.backup_branch_name.clone(),
            }
            .into());
        }

        let name = desired.map_or_else(
            || self.config.backup.backup_branch_name(working),
            str::to_string,
        );
        if !self.vcs.is_valid_branch_name(&name)? {
            return Err(Precondition::InvalidBranchName { name }.into());
        }
        let remote = &self.config.backup.remote;
        let collides = records.values().any(|r| r.backup_branch_name == name)
            || self.vcs.local_branch_exists(&name)?
            || self.vcs.remote_branch_exists(remote, &name)?;
        if collides {
            return Err(BackupError::NameCollision { name }.into());
        }

        let commits_file = self.config.branch_info.commits_file();
        if commits_file {
            self.require_checked_out(working)?;
        }

        self.checkpoint(Step::UnstageChanges)?;
        info!(working, backup = %name, "Creating backup branch");
        self.vcs
            .unstage_all()
            .map_err(step_failed(Step::UnstageChanges))?;

        let record = BackupRecord::new(&name, self.config.backup.default_auto_backup);
        if commits_file {
            self.record_and_commit(working, record)?;
            self.vcs
                .create_branch(&name, working)
                .map_err(|e| partial(Step::CommitBranchInfo, Step::CreateBranch, e))?;
        } else {
            self.vcs
                .create_branch(&name, working)
                .map_err(step_failed(Step::CreateBranch))?;
            if let Err(e) = self.store.set(info_path, working, record) {
                warn!(error = %e, "Recording failed, removing new backup branch");
                self.forget(working);
                return Err(match self.vcs.delete_local_branch(&name) {
                    Ok(()) => e.into(),
                    Err(_) => partial(Step::CreateBranch, Step::RecordBranchInfo, e),
                });
            }
        }
        Ok(name)
    }

    /// Persist the record and commit the branch-info file on `working`.
    fn record_and_commit(&self, working: &str, record: BackupRecord) -> AgbResult<()> {
        let info_path = &self.config.branch_info.path;
        if let Err(e) = self.store.set(info_path, working, record) {
            self.forget(working);
            return Err(e.into());
        }
        let pathspec = info_path.to_string_lossy();
        if let Err(source) = self.vcs.add(&pathspec) {
            self.forget(working);
            return Err(step_failed(Step::CommitBranchInfo)(source));
        }
        let message = format!("agb: create backup branch for [{working}]");
        if let Err(source) = self.vcs.commit(&message) {
            self.unstage();
            self.forget(working);
            return Err(step_failed(Step::CommitBranchInfo)(source));
        }
        debug!(path = %pathspec, "Committed branch info");
        Ok(())
    }

    /// Unlink `working` and delete its local backup branch. The remote
    /// backup branch is left alone.
    ///
    /// # Errors
    ///
    /// `NotLinked`, a storage error, or `PartialFailure` when the record was
    /// removed but the branch could not be deleted.
    pub fn retire_backup_branch(&self, working: &str) -> AgbResult<BackupRecord> {
        let record = self.linked(working)?;
        let backup = &record.backup_branch_name;
        self.checkpoint(Step::RemoveRecord)?;

        info!(working, %backup, "Retiring backup branch");
        self.store.delete(&self.config.branch_info.path, working)?;

        if self.vcs.local_branch_exists(backup)? {
            self.vcs
                .delete_local_branch(backup)
                .map_err(|e| partial(Step::RemoveRecord, Step::DeleteBranch, e))?;
        } else {
            warn!(%backup, "Local backup branch already gone");
        }
        Ok(record)
    }

    /// Point the local backup branch at the working tip again.
    ///
    /// # Errors
    ///
    /// `NotLinked`, or the failing delete/create step.
    pub fn sync_backup_branch(&self, working: &str) -> AgbResult<String> {
        let record = self.linked(working)?;
        self.checkpoint(Step::SyncBranch)?;
        info!(working, backup = %record.backup_branch_name, "Syncing backup branch");
        self.recreate(working, &record.backup_branch_name)?;
        Ok(record.backup_branch_name)
    }

    fn recreate(&self, working: &str, backup: &str) -> AgbResult<()> {
        let existed = self.vcs.local_branch_exists(backup)?;
        if existed {
            self.vcs
                .delete_local_branch(backup)
                .map_err(step_failed(Step::DeleteBranch))?;
        }
        self.vcs.create_branch(backup, working).map_err(|e| {
            if existed {
                partial(Step::DeleteBranch, Step::CreateBranch, e)
            } else {
                step_failed(Step::CreateBranch)(e)
            }
        })
    }

    fn mirrors(&self, working: &str, backup: &str) -> AgbResult<bool> {
        if !self.vcs.local_branch_exists(backup)? {
            return Ok(false);
        }
        Ok(self.verifier().divergence(working, backup)?.is_identical())
    }

    // --- backup ---

    /// Snapshot the work tree of `working` onto `<remote>/<backup>`.
    ///
    /// `working` must be checked out. On every path past the checkout of the
    /// backup branch the working branch is checked out again.
    ///
    /// # Errors
    ///
    /// `NotLinked`, `CheckoutConflict`, `CommitEmpty`, `PushRejected`,
    /// `Cancelled`, or `PartialFailure` after the push went through.
    pub fn backup(&self, working: &str) -> AgbResult<BackupReport> {
        let record = self.linked(working)?;
        let backup = record.backup_branch_name;
        let remote = self.config.backup.remote.clone();
        self.require_checked_out(working)?;
        info!(working, %backup, "Backing up working branch");

        self.checkpoint(Step::UnstageChanges)?;
        self.vcs
            .unstage_all()
            .map_err(step_failed(Step::UnstageChanges))?;

        if self.config.backup.sync_before_backup && !self.mirrors(working, &backup)? {
            info!(%backup, "Backup branch is stale, syncing first");
            self.recreate(working, &backup)?;
        }

        self.checkpoint(Step::CheckoutBackup)?;
        if let Err(source) = self.vcs.checkout(&backup) {
            return Err(BackupError::CheckoutConflict {
                branch: backup,
                working: working.to_string(),
                source,
            }
            .into());
        }

        let outcome = self.snapshot_and_push(working, &backup, &remote);
        match (outcome, self.vcs.checkout(working)) {
            (Ok(snapshot_id), Ok(())) => {
                info!(working, %backup, %remote, %snapshot_id, "Backup complete");
                Ok(BackupReport {
                    working: working.to_string(),
                    backup,
                    remote,
                    snapshot_id,
                })
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(source)) => Err(partial(Step::RewindBackup, Step::CheckoutWorking, source)),
            (Err(e), Err(source)) => {
                error!(error = %source, "Backup failed and the working branch could not be restored");
                let completed = match e.as_backup() {
                    Some(BackupError::PartialFailure { completed, .. }) => *completed,
                    _ => Step::CheckoutBackup,
                };
                Err(partial(completed, Step::CheckoutWorking, e))
            }
        }
    }

    /// Runs on the backup branch. Leaves the backup branch at the working
    /// tip on every path that returns `Ok`, and on every path that did not
    /// reach the push.
    fn snapshot_and_push(&self, working: &str, backup: &str, remote: &str) -> AgbResult<String> {
        self.checkpoint(Step::StageChanges)?;
        if let Err(source) = self.vcs.add(".") {
            self.unstage();
            return Err(step_failed(Step::StageChanges)(source));
        }

        let snapshot_id = Uuid::new_v4().to_string();
        match self.vcs.commit(&format!("agb: backup commit [{snapshot_id}]")) {
            Ok(()) => {}
            Err(GitError::NothingToCommit) => {
                self.unstage();
                return Err(BackupError::CommitEmpty {
                    branch: working.to_string(),
                }
                .into());
            }
            Err(source) => {
                self.unstage();
                return Err(step_failed(Step::Commit)(source));
            }
        }
        debug!(%snapshot_id, "Snapshot committed");

        if let Err(e) = self.checkpoint(Step::Push) {
            return Err(self.undo_snapshot(e));
        }
        if let Err(source) = self.vcs.push(remote, backup, true) {
            let rejected = BackupError::PushRejected {
                remote: remote.to_string(),
                branch: backup.to_string(),
                source,
            };
            return Err(self.undo_snapshot(rejected.into()));
        }

        self.vcs
            .reset(ResetMode::Mixed, "HEAD~1")
            .map_err(|e| partial(Step::Push, Step::RewindBackup, e))?;
        Ok(snapshot_id)
    }

    /// Drop the unpushed snapshot commit, keeping its changes in the work
    /// tree so they follow the checkout back to the working branch.
    fn undo_snapshot(&self, cause: AgbError) -> AgbError {
        match self.vcs.reset(ResetMode::Mixed, "HEAD~1") {
            Ok(()) => cause,
            Err(source) => {
                error!(error = %cause, "Snapshot commit could not be undone");
                partial(Step::Commit, Step::UndoSnapshot, source)
            }
        }
    }

    // --- load ---

    /// Replace the uncommitted state of `working` with the latest snapshot.
    ///
    /// Returns `false` when the branches were out of sync and the user
    /// declined to continue.
    ///
    /// # Errors
    ///
    /// `UnsavedDocuments`, `NotLinked` (no record and no name given),
    /// `InvalidBranchName`, `CheckoutConflict`, `VcsProtocol`, `StepFailed`,
    /// `Cancelled` or `PartialFailure`.
    pub fn load_backup(
        &self,
        working: &str,
        unsaved_documents: bool,
        prompter: &dyn Prompter,
    ) -> AgbResult<bool> {
        if unsaved_documents {
            return Err(Precondition::UnsavedDocuments.into());
        }
        let backup = self.backup_name_for_load(working, prompter)?;
        self.require_checked_out(working)?;
        info!(working, %backup, "Loading backup");

        self.checkpoint(Step::Stash)?;
        if self.vcs.has_uncommitted_changes()? {
            self.vcs.stash().map_err(step_failed(Step::Stash))?;
            warn!(branch = working, "Stashed local changes, restore them with `git stash pop`");
        }

        self.checkpoint(Step::CheckoutBackup)?;
        if let Err(source) = self.vcs.checkout(&backup) {
            return Err(BackupError::CheckoutConflict {
                branch: backup,
                working: working.to_string(),
                source,
            }
            .into());
        }

        self.restore_on_backup(working, &backup, prompter)
            .inspect_err(|_| self.return_to(working))
    }

    fn backup_name_for_load(&self, working: &str, prompter: &dyn Prompter) -> AgbResult<String> {
        if let Some(record) = self.store.get(&self.config.branch_info.path, working) {
            return Ok(record.backup_branch_name);
        }
        let question = format!("No backup branch recorded for \"{working}\". Load from branch");
        let name = prompter
            .input(&question)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Precondition::NotLinked {
                branch: working.to_string(),
            })?;
        if !self.vcs.is_valid_branch_name(&name)? {
            return Err(Precondition::InvalidBranchName { name }.into());
        }
        Ok(name)
    }

    fn restore_on_backup(
        &self,
        working: &str,
        backup: &str,
        prompter: &dyn Prompter,
    ) -> AgbResult<bool> {
        let remote = &self.config.backup.remote;

        self.checkpoint(Step::Fetch)?;
        self.vcs.fetch(remote).map_err(step_failed(Step::Fetch))?;

        self.checkpoint(Step::ResetToRemote)?;
        let remote_ref = self.config.backup.remote_ref(backup);
        self.vcs
            .reset(ResetMode::Hard, &remote_ref)
            .map_err(step_failed(Step::ResetToRemote))?;

        if !self.verifier().is_in_sync(working, backup, 0, 1)? {
            warn!(%backup, "Backup is not exactly one snapshot ahead of the working branch");
            self.vcs
                .checkout(working)
                .map_err(step_failed(Step::CheckoutWorking))?;
            let question = format!(
                "\"{working}\" and \"{backup}\" are out of sync. Load the backup anyway?"
            );
            if !prompter.confirm(&question) {
                info!("Load cancelled by user");
                return Ok(false);
            }
            self.checkpoint(Step::CheckoutBackup)?;
            self.vcs.checkout(backup).map_err(|source| BackupError::CheckoutConflict {
                branch: backup.to_string(),
                working: working.to_string(),
                source,
            })?;
        }

        self.checkpoint(Step::UnpackSnapshot)?;
        self.vcs
            .reset(ResetMode::Mixed, "HEAD~1")
            .map_err(step_failed(Step::UnpackSnapshot))?;
        self.vcs
            .checkout(working)
            .map_err(|e| partial(Step::UnpackSnapshot, Step::CheckoutWorking, e))?;
        info!(working, %backup, "Backup loaded");
        Ok(true)
    }

    // --- records ---

    /// # Errors
    ///
    /// `NotLinked` or a storage error.
    pub fn set_auto_backup(&self, working: &str, flag: bool) -> AgbResult<()> {
        let mut record = self.linked(working)?;
        record.auto_backup = flag;
        self.store
            .set(&self.config.branch_info.path, working, record)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn set_auto_backup_for_all(&self, flag: bool) -> AgbResult<usize> {
        Ok(self
            .store
            .set_auto_backup_for_all(&self.config.branch_info.path, flag)?)
    }

    /// Whether saving on `working` should trigger a backup.
    #[must_use]
    pub fn should_auto_backup(&self, working: &str) -> bool {
        self.store
            .get(&self.config.branch_info.path, working)
            .is_some_and(|r| r.auto_backup)
    }

    /// # Errors
    ///
    /// Returns a `GitError` or `VcsProtocol` error if the branches cannot be
    /// compared.
    pub fn status(&self, working: &str) -> AgbResult<BranchStatus> {
        let record = self.store.get(&self.config.branch_info.path, working);
        let mut status = BranchStatus {
            working: working.to_string(),
            record: record.clone(),
            local_exists: false,
            local: None,
            remote: None,
        };
        let Some(record) = record else {
            return Ok(status);
        };
        let backup = &record.backup_branch_name;
        status.local_exists = self.vcs.local_branch_exists(backup)?;
        if status.local_exists {
            let verifier = self.verifier();
            status.local = Some(verifier.divergence(working, backup)?);
            if self
                .vcs
                .remote_branch_exists(&self.config.backup.remote, backup)?
            {
                let remote_ref = self.config.backup.remote_ref(backup);
                status.remote = Some(verifier.divergence(backup, &remote_ref)?);
            }
        }
        Ok(status)
    }
}
