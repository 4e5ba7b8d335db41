// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! GitQuery (read)     --> GixBackend (pure Rust gix)
//! GitMutation (write) --> ShellBackend (git CLI)
//! plumbing            --> ShellBackend (rev-list, check-ref-format, config)
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{GitError, GitResult, GixError};

use super::vcs::{DivergenceReport, ResetMode};

// --- Query Trait (Read-only operations) ---

/// Read-only git query operations.
pub trait GitQuery {
    /// Check if path is inside a git work tree.
    fn is_git_repo(path: &Path) -> bool;

    /// Get current branch name (None if HEAD is detached).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or head resolution fails.
    fn current_branch(path: &Path) -> GitResult<Option<String>>;

    /// Check whether a fully qualified reference (`refs/heads/...`) exists.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or reference lookup fails.
    fn reference_exists(path: &Path, full_name: &str) -> GitResult<bool>;

    /// Check for staged or unstaged changes to tracked files, which is what
    /// `git stash push` saves. Untracked files are ignored.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or status check fails.
    fn has_uncommitted_changes(path: &Path) -> GitResult<bool>;
}

// --- Mutation Trait (Write operations) ---

/// Git mutation operations that modify repository state.
///
/// All of these go through the git CLI so credential helpers, hooks and
/// SSH configuration behave exactly as they do for the user.
pub trait GitMutation {
    /// Switch the working tree to `branch`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if local changes conflict with the target.
    fn checkout(repo_path: &Path, branch: &str) -> GitResult<()>;

    /// Create `name` pointing at `start`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the branch exists or `start` does not resolve.
    fn create_branch(repo_path: &Path, name: &str, start: &str) -> GitResult<()>;

    /// Delete local branch `name`, merged or not.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the branch is missing or checked out.
    fn delete_branch(repo_path: &Path, name: &str) -> GitResult<()>;

    /// Unstage everything, keeping working-tree content.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the reset fails.
    fn unstage_all(repo_path: &Path) -> GitResult<()>;

    /// Move the current branch to `rev`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if `rev` does not resolve.
    fn reset(repo_path: &Path, mode: ResetMode, rev: &str) -> GitResult<()>;

    /// Stash tracked changes. A clean tree is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the stash fails.
    fn stash(repo_path: &Path) -> GitResult<()>;

    /// Stage `pathspec`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the pathspec matches nothing or cannot be read.
    fn add(repo_path: &Path, pathspec: &str) -> GitResult<()>;

    /// Commit the index.
    ///
    /// # Errors
    ///
    /// Returns `GitError::NothingToCommit` when the index matches HEAD.
    fn commit(repo_path: &Path, message: &str) -> GitResult<()>;

    /// Push `branch` to `remote`, optionally with `--force`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` on network, authentication or rejection failures.
    fn push(repo_path: &Path, remote: &str, branch: &str, force: bool) -> GitResult<()>;

    /// Fetch from remote.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the fetch operation fails.
    fn fetch(repo_path: &Path, remote: &str) -> GitResult<()>;

    /// Set git config value.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the config value cannot be set.
    fn set_config(repo_path: &Path, key: &str, value: &str) -> GitResult<()>;
}

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix. Read-only, no subprocesses.
pub struct GixBackend;

impl GixBackend {
    fn discover(path: &Path) -> GitResult<gix::Repository> {
        gix::discover(path).map_err(|e| GitError::Gix(GixError::Discover(Box::new(e))))
    }

    /// Root of the work tree containing `path`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if no repository is found or it is bare.
    pub fn workdir(path: &Path) -> GitResult<PathBuf> {
        let repo = Self::discover(path)?;
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::Gix(GixError::BareRepository))
    }

    /// The `.git` directory of the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if no repository is found.
    pub fn git_dir(path: &Path) -> GitResult<PathBuf> {
        Ok(Self::discover(path)?.git_dir().to_path_buf())
    }
}

impl GitQuery for GixBackend {
    fn is_git_repo(path: &Path) -> bool {
        gix::discover(path).is_ok()
    }

    fn current_branch(path: &Path) -> GitResult<Option<String>> {
        let repo = Self::discover(path)?;
        let head = repo
            .head_name()
            .map_err(|e| GitError::Gix(GixError::Reference(e)))?;
        Ok(head.map(|name| name.shorten().to_string()))
    }

    fn reference_exists(path: &Path, full_name: &str) -> GitResult<bool> {
        let repo = Self::discover(path)?;
        match repo.find_reference(full_name) {
            Ok(_) => Ok(true),
            Err(gix::reference::find::existing::Error::NotFound { name: _ }) => Ok(false),
            Err(e) => Err(GitError::Gix(GixError::Reference(e))),
        }
    }

    fn has_uncommitted_changes(path: &Path) -> GitResult<bool> {
        use gix::status::UntrackedFiles;

        let repo = Self::discover(path)?;

        let has_changes = repo
            .status(gix::progress::Discard)
            .map_err(|_| GitError::CommandFailed {
                command: "status".to_string(),
                message: "failed to prepare status check".to_string(),
            })?
            .untracked_files(UntrackedFiles::None)
            .into_iter(None)
            .map_err(|_| GitError::CommandFailed {
                command: "status".to_string(),
                message: "failed to check repository status".to_string(),
            })?
            .next()
            .is_some();

        Ok(has_changes)
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Shell-based git backend using the git CLI.
pub struct ShellBackend;

fn git_executable() -> GitResult<&'static Path> {
    static GIT: OnceLock<Option<PathBuf>> = OnceLock::new();
    GIT.get_or_init(|| which::which("git").ok())
        .as_deref()
        .ok_or(GitError::GitNotFound)
}

impl ShellBackend {
    /// Non-interactive git process in `cwd` with untranslated messages.
    pub(crate) fn git_process(args: &[&str], cwd: &Path) -> GitResult<std::process::Command> {
        let mut process = std::process::Command::new(git_executable()?);
        process
            .args(args)
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C");
        Ok(process)
    }

    /// Execute a git command built by [`Self::git_process`].
    ///
    /// Returns trimmed stdout. On failure the message is stderr, or stdout when
    /// git reported on stdout only (as `commit` does).
    pub(crate) fn git_command(args: &[&str], cwd: &Path) -> GitResult<String> {
        let command = format!("git {}", args.join(" "));
        tracing::trace!(%command, cwd = %cwd.display(), "running");

        let output = Self::git_process(args, cwd)?
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: command.clone(),
                message: format!("failed to execute git: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::CommandFailed {
                command,
                message: if stderr.is_empty() { stdout } else { stderr },
            });
        }
        Ok(stdout)
    }

    /// Count commits unique to each side of `left...right`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::UnexpectedOutput` if git's answer is not two counts.
    pub fn divergence(repo_path: &Path, left: &str, right: &str) -> GitResult<DivergenceReport> {
        let range = format!("{left}...{right}");
        let output = Self::git_command(&["rev-list", "--left-right", "--count", &range], repo_path)?;
        DivergenceReport::parse(&output).ok_or_else(|| GitError::UnexpectedOutput {
            command: format!("git rev-list --left-right --count {range}"),
            output,
        })
    }

    /// Whether `name` is acceptable as a branch name.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` only if git cannot be run.
    pub fn is_valid_branch_name(repo_path: &Path, name: &str) -> GitResult<bool> {
        match Self::git_command(&["check-ref-format", "--branch", name], repo_path) {
            Ok(_) => Ok(true),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a git config value (None if unset).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` only if git cannot be run.
    pub fn get_config(repo_path: &Path, key: &str) -> GitResult<Option<String>> {
        match Self::git_command(&["config", "--get", key], repo_path) {
            Ok(value) => Ok(Some(value)),
            Err(GitError::CommandFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl GitMutation for ShellBackend {
    fn checkout(repo_path: &Path, branch: &str) -> GitResult<()> {
        Self::git_command(&["checkout", "-q", branch], repo_path)?;
        Ok(())
    }

    fn create_branch(repo_path: &Path, name: &str, start: &str) -> GitResult<()> {
        Self::git_command(&["branch", "--no-track", name, start], repo_path)?;
        Ok(())
    }

    fn delete_branch(repo_path: &Path, name: &str) -> GitResult<()> {
        Self::git_command(&["branch", "-D", name], repo_path)?;
        Ok(())
    }

    fn unstage_all(repo_path: &Path) -> GitResult<()> {
        Self::git_command(&["reset", "-q"], repo_path)?;
        Ok(())
    }

    fn reset(repo_path: &Path, mode: ResetMode, rev: &str) -> GitResult<()> {
        Self::git_command(&["reset", "-q", mode.as_flag(), rev], repo_path)?;
        Ok(())
    }

    fn stash(repo_path: &Path) -> GitResult<()> {
        Self::git_command(&["stash", "push", "--quiet"], repo_path)?;
        Ok(())
    }

    fn add(repo_path: &Path, pathspec: &str) -> GitResult<()> {
        Self::git_command(&["add", "--", pathspec], repo_path)?;
        Ok(())
    }

    fn commit(repo_path: &Path, message: &str) -> GitResult<()> {
        match Self::git_command(&["commit", "-q", "-m", message], repo_path) {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { message, .. })
                if message.contains("nothing to commit")
                    || message.contains("no changes added to commit") =>
            {
                Err(GitError::NothingToCommit)
            }
            Err(e) => Err(e),
        }
    }

    fn push(repo_path: &Path, remote: &str, branch: &str, force: bool) -> GitResult<()> {
        let mut args = vec!["push", "--quiet"];
        if force {
            args.push("--force");
        }
        args.extend([remote, branch]);
        Self::git_command(&args, repo_path)?;
        Ok(())
    }

    fn fetch(repo_path: &Path, remote: &str) -> GitResult<()> {
        Self::git_command(&["fetch", "--quiet", remote], repo_path)?;
        Ok(())
    }

    fn set_config(repo_path: &Path, key: &str, value: &str) -> GitResult<()> {
        Self::git_command(&["config", key, value], repo_path)?;
        Ok(())
    }
}

impl GitQuery for ShellBackend {
    fn is_git_repo(path: &Path) -> bool {
        Self::git_command(&["rev-parse", "--is-inside-work-tree"], path).is_ok()
    }

    fn current_branch(path: &Path) -> GitResult<Option<String>> {
        Self::git_command(&["symbolic-ref", "--short", "HEAD"], path)
            .map_or_else(|_| Ok(None), |branch| Ok(Some(branch)))
    }

    fn reference_exists(path: &Path, full_name: &str) -> GitResult<bool> {
        let output = Self::git_command(&["show-ref", "--verify", "--quiet", full_name], path);
        Ok(output.is_ok())
    }

    fn has_uncommitted_changes(path: &Path) -> GitResult<bool> {
        let output =
            Self::git_command(&["status", "--porcelain", "--untracked-files=no"], path)?;
        Ok(!output.is_empty())
    }
}
