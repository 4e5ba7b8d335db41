// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! [`Vcs`] implementation for an on-disk repository.
//!
//! ```text
//! GitRepo
//!   reads  --> GixBackend   (HEAD, refs, status)
//!   writes --> ShellBackend (checkout, commit, push, ...)
//!   counts --> ShellBackend (rev-list --left-right --count)
//! ```

use std::path::{Path, PathBuf};

use crate::error::GitResult;

use super::backend::{GitMutation, GitQuery, GixBackend, ShellBackend};
use super::vcs::{DivergenceReport, ResetMode, Vcs};

/// A git work tree addressed by its root directory.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    git_dir: PathBuf,
}

impl GitRepo {
    /// Find the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if `path` is not inside a non-bare repository.
    pub fn discover(path: &Path) -> GitResult<Self> {
        let root = GixBackend::workdir(path)?;
        let git_dir = GixBackend::git_dir(path)?;
        Ok(Self { root, git_dir })
    }

    /// Work tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

impl Vcs for GitRepo {
    fn current_branch(&self) -> GitResult<Option<String>> {
        GixBackend::current_branch(&self.root)
    }

    fn local_branch_exists(&self, name: &str) -> GitResult<bool> {
        GixBackend::reference_exists(&self.root, &format!("refs/heads/{name}"))
    }

    fn remote_branch_exists(&self, remote: &str, name: &str) -> GitResult<bool> {
        GixBackend::reference_exists(&self.root, &format!("refs/remotes/{remote}/{name}"))
    }

    fn is_valid_branch_name(&self, name: &str) -> GitResult<bool> {
        ShellBackend::is_valid_branch_name(&self.root, name)
    }

    fn create_branch(&self, name: &str, start: &str) -> GitResult<()> {
        ShellBackend::create_branch(&self.root, name, start)
    }

    fn delete_local_branch(&self, name: &str) -> GitResult<()> {
        ShellBackend::delete_branch(&self.root, name)
    }

    fn checkout(&self, branch: &str) -> GitResult<()> {
        ShellBackend::checkout(&self.root, branch)
    }

    fn unstage_all(&self) -> GitResult<()> {
        ShellBackend::unstage_all(&self.root)
    }

    fn reset(&self, mode: ResetMode, rev: &str) -> GitResult<()> {
        ShellBackend::reset(&self.root, mode, rev)
    }

    fn stash(&self) -> GitResult<()> {
        ShellBackend::stash(&self.root)
    }

    fn add(&self, pathspec: &str) -> GitResult<()> {
        ShellBackend::add(&self.root, pathspec)
    }

    fn commit(&self, message: &str) -> GitResult<()> {
        ShellBackend::commit(&self.root, message)
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> GitResult<()> {
        ShellBackend::push(&self.root, remote, branch, force)
    }

    fn fetch(&self, remote: &str) -> GitResult<()> {
        ShellBackend::fetch(&self.root, remote)
    }

    fn count_divergence(&self, left: &str, right: &str) -> GitResult<DivergenceReport> {
        ShellBackend::divergence(&self.root, left, right)
    }

    fn has_uncommitted_changes(&self) -> GitResult<bool> {
        GixBackend::has_uncommitted_changes(&self.root)
    }

    fn get_config(&self, key: &str) -> GitResult<Option<String>> {
        ShellBackend::get_config(&self.root, key)
    }

    fn set_config(&self, key: &str, value: &str) -> GitResult<()> {
        ShellBackend::set_config(&self.root, key, value)
    }
}
