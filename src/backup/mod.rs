// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup branch state machine.
//!
//! ```text
//!   caller (cmd / editor hook)
//!            |
//!            v
//!   Session ------ RepoLock (mutex + <git-dir>/agb.lock)
//!    |  enabled, Config, CancellationToken
//!    v
//!   BackupOrchestrator
//!    |        |          |
//!    v        v          v
//!  store   verify      dyn Vcs
//!  (records) (ahead/behind counts)
//! ```
//!
//! # States (derived per call, never persisted)
//!
//! ```text
//!   NoBackup --create--> BackupLinked --retire--> NoBackup
//!                         |    ^
//!                  backup |    | sync
//!                         v    |
//!             BackupInSync / BackupDiverged
//! ```
//!
//! After a successful `backup` the local backup branch equals the working
//! tip and `<remote>/<backup>` is exactly one snapshot commit ahead of it.

pub mod lock;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod store;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use orchestrator::{BackupOrchestrator, BackupReport, BackupState, BranchStatus};
pub use prompt::{AssumeYes, Prompter};
pub use session::Session;
pub use store::{BranchInfoStore, JsonFileStorage, MemoryStorage, RecordStorage};
pub use verify::SyncVerifier;

/// Per working-branch metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    /// Run `backup` on every save.
    pub auto_backup: bool,
    /// Shadow branch mirroring the working branch.
    pub backup_branch_name: String,
}

impl BackupRecord {
    #[must_use]
    pub fn new(backup_branch_name: impl Into<String>, auto_backup: bool) -> Self {
        Self {
            auto_backup,
            backup_branch_name: backup_branch_name.into(),
        }
    }
}
