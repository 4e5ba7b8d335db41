// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              AgbError (~24 bytes)
//!                     |
//!     +-------+-------+-------+-------+
//!     v       v       v       v       v
//!   Backup   Git   Storage  Config   Io
//!    Box     Box     Box     Box     Box
//!
//! Sub-errors (unboxed internally):
//!   Backup   PreconditionFailed, NameCollision, CheckoutConflict,
//!            CommitEmpty, PushRejected, VcsProtocol, StepFailed,
//!            PartialFailure, Cancelled
//!   Git      CommandFailed, NothingToCommit, UnexpectedOutput, Gix
//!   Storage  Read, Write, Serialize
//!   Config   ParseError, InvalidValue
//! ```

use std::fmt;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`AgbError`].
pub type AgbResult<T> = std::result::Result<T, AgbError>;

/// Result type for raw VCS port calls.
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum AgbError {
    /// A backup workflow was refused or failed part-way.
    #[error("{0}")]
    Backup(#[from] Box<BackupError>),

    /// Git operation failed outside of a workflow step.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// Branch-info persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] Box<StorageError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),
}

impl AgbError {
    /// Returns the backup workflow error, if this is one.
    #[must_use]
    pub fn as_backup(&self) -> Option<&BackupError> {
        match self {
            Self::Backup(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the precondition that was violated, if any.
    #[must_use]
    pub fn precondition(&self) -> Option<&Precondition> {
        match self.as_backup() {
            Some(BackupError::PreconditionFailed(p)) => Some(p),
            _ => None,
        }
    }
}

macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for AgbError {
                fn from(err: $error) -> Self {
                    AgbError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    BackupError => Backup,
    GitError => Git,
    StorageError => Storage,
    ConfigError => Config,
    std::io::Error => Io,
}

impl From<Precondition> for AgbError {
    fn from(p: Precondition) -> Self {
        BackupError::PreconditionFailed(p).into()
    }
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to resolve HEAD or look up a reference.
    #[error("failed to look up reference: {0}")]
    Reference(#[from] gix::reference::find::existing::Error),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Git Errors ---

/// Failures reported by the VCS port.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git executable could not be located.
    #[error("git executable not found in PATH")]
    GitNotFound,

    /// Git command exited unsuccessfully.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Commit refused because nothing was staged.
    #[error("nothing to commit")]
    NothingToCommit,

    /// Git produced output that could not be interpreted.
    #[error("unexpected output from {command}: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

// --- Backup Errors ---

/// A named step of a backup workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    UnstageChanges,
    RecordBranchInfo,
    CommitBranchInfo,
    CreateBranch,
    RemoveRecord,
    DeleteBranch,
    SyncBranch,
    CheckoutBackup,
    StageChanges,
    Commit,
    Push,
    UndoSnapshot,
    RewindBackup,
    CheckoutWorking,
    Stash,
    Fetch,
    ResetToRemote,
    UnpackSnapshot,
}

impl Step {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnstageChanges => "unstage changes",
            Self::RecordBranchInfo => "record branch info",
            Self::CommitBranchInfo => "commit branch info",
            Self::CreateBranch => "create backup branch",
            Self::RemoveRecord => "remove branch info",
            Self::DeleteBranch => "delete backup branch",
            Self::SyncBranch => "sync backup branch",
            Self::CheckoutBackup => "checkout backup branch",
            Self::StageChanges => "stage changes",
            Self::Commit => "commit snapshot",
            Self::Push => "push backup branch",
            Self::UndoSnapshot => "undo snapshot commit",
            Self::RewindBackup => "rewind backup branch",
            Self::CheckoutWorking => "checkout working branch",
            Self::Stash => "stash changes",
            Self::Fetch => "fetch remote",
            Self::ResetToRemote => "reset to remote backup",
            Self::UnpackSnapshot => "unpack snapshot",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons an operation refused to start. No VCS mutation has happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("active git backup is disabled")]
    Disabled,

    #[error("HEAD is detached, check out a working branch first")]
    DetachedHead,

    #[error("\"{branch}\" already has a backup branch \"{backup}\"")]
    AlreadyLinked { branch: String, backup: String },

    #[error("no backup branch found for \"{branch}\", create one first")]
    NotLinked { branch: String },

    #[error("detected unsaved changes in the workspace")]
    UnsavedDocuments,

    #[error("\"{name}\" is not a valid branch name")]
    InvalidBranchName { name: String },

    #[error("\"{branch}\" must be checked out")]
    NotCheckedOut { branch: String },

    #[error("another backup operation is in progress ({holder})")]
    OperationInProgress { holder: String },
}

/// Backup workflow errors.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Operation refused before touching the repository.
    #[error("precondition failed: {0}")]
    PreconditionFailed(Precondition),

    /// Intended backup branch name is already taken.
    #[error("backup branch name \"{name}\" already exists")]
    NameCollision { name: String },

    /// Could not switch to the backup branch.
    #[error(
        "failed to checkout backup branch \"{branch}\", it is likely out of sync with \"{working}\": {source}"
    )]
    CheckoutConflict {
        branch: String,
        working: String,
        #[source]
        source: GitError,
    },

    /// Snapshot commit had nothing to record.
    #[error("nothing to back up on \"{branch}\"")]
    CommitEmpty { branch: String },

    /// Force push to the backup remote failed.
    #[error("failed to push \"{branch}\" to \"{remote}\": {source}")]
    PushRejected {
        remote: String,
        branch: String,
        #[source]
        source: GitError,
    },

    /// Divergence counts could not be parsed.
    #[error("cannot compare \"{left}\" and \"{right}\": {source}")]
    VcsProtocol {
        left: String,
        right: String,
        #[source]
        source: GitError,
    },

    /// A step failed before anything irreversible happened.
    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: GitError,
    },

    /// An irreversible step succeeded and a later one failed.
    #[error("{failed} failed after {completed} completed: {source}")]
    PartialFailure {
        completed: Step,
        failed: Step,
        #[source]
        source: Box<AgbError>,
    },

    /// Cancellation was requested before `step`.
    #[error("cancelled before {step}")]
    Cancelled { step: Step },
}

// --- Storage Errors ---

/// Branch-info persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read the branch-info file.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the branch-info file.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Branch-info content is not valid JSON for the expected shape.
    #[error("malformed branch info in '{path}': {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration sources.
    #[error("failed to parse configuration: {message}")]
    ParseError { message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}
