// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The VCS port consumed by the backup workflows.
//!
//! ```text
//! BackupOrchestrator --> dyn Vcs --> GitRepo (gix + git CLI)
//!                                \-> FakeVcs (tests)
//! ```
//!
//! Every call returns a tagged [`GitResult`]; callers decide per step what a
//! failure means.

use std::fmt;

use crate::error::GitResult;

/// How far `reset` rewrites state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Move the branch, keep index and working tree.
    Soft,
    /// Move the branch and index, keep working tree.
    Mixed,
    /// Move the branch, discard index and working tree changes.
    Hard,
}

impl ResetMode {
    #[must_use]
    pub const fn as_flag(self) -> &'static str {
        match self {
            Self::Soft => "--soft",
            Self::Mixed => "--mixed",
            Self::Hard => "--hard",
        }
    }
}

/// Commits unique to each side of a two-branch comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DivergenceReport {
    /// Reachable from the left branch only.
    pub ahead: usize,
    /// Reachable from the right branch only.
    pub behind: usize,
}

impl DivergenceReport {
    #[must_use]
    pub const fn new(ahead: usize, behind: usize) -> Self {
        Self { ahead, behind }
    }

    /// Parse `git rev-list --left-right --count` output (`"<left>\t<right>"`).
    #[must_use]
    pub fn parse(output: &str) -> Option<Self> {
        let mut counts = output.split_whitespace().map(str::parse::<usize>);
        let ahead = counts.next()?.ok()?;
        let behind = counts.next()?.ok()?;
        if counts.next().is_some() {
            return None;
        }
        Some(Self { ahead, behind })
    }

    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

impl fmt::Display for DivergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ahead, {} behind", self.ahead, self.behind)
    }
}

/// Version-control primitives the backup workflows are built from.
///
/// Implementations must not retry or reorder calls.
pub trait Vcs: Send + Sync {
    /// Checked-out branch, or `None` on a detached HEAD.
    fn current_branch(&self) -> GitResult<Option<String>>;

    fn local_branch_exists(&self, name: &str) -> GitResult<bool>;

    /// Whether `<remote>/<name>` exists as a remote-tracking branch.
    fn remote_branch_exists(&self, remote: &str, name: &str) -> GitResult<bool>;

    fn is_valid_branch_name(&self, name: &str) -> GitResult<bool>;

    fn create_branch(&self, name: &str, start: &str) -> GitResult<()>;

    fn delete_local_branch(&self, name: &str) -> GitResult<()>;

    /// Fails when local changes would be overwritten.
    fn checkout(&self, branch: &str) -> GitResult<()>;

    /// Clear the index without touching the working tree.
    fn unstage_all(&self) -> GitResult<()>;

    fn reset(&self, mode: ResetMode, rev: &str) -> GitResult<()>;

    fn stash(&self) -> GitResult<()>;

    fn add(&self, pathspec: &str) -> GitResult<()>;

    /// Fails with `GitError::NothingToCommit` when nothing is staged.
    fn commit(&self, message: &str) -> GitResult<()>;

    fn push(&self, remote: &str, branch: &str, force: bool) -> GitResult<()>;

    fn fetch(&self, remote: &str) -> GitResult<()>;

    /// Counts of commits in `left` but not `right`, and vice versa.
    ///
    /// Unparseable output is a `GitError::UnexpectedOutput`, never a guess.
    fn count_divergence(&self, left: &str, right: &str) -> GitResult<DivergenceReport>;

    /// Tracked files differ from HEAD. Untracked files do not count.
    fn has_uncommitted_changes(&self) -> GitResult<bool>;

    fn get_config(&self, key: &str) -> GitResult<Option<String>>;

    fn set_config(&self, key: &str, value: &str) -> GitResult<()>;
}
