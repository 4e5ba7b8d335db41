// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory [`Vcs`] for state machine tests.
//!
//! ```text
//! branches  name -> [c1, c2, ...]   linear history, tip last
//! server    name -> [...]           branches on the single remote
//! tracking  name -> [...]           <remote>/<name>, updated by push/fetch
//! dirty     paths changed in the work tree (staged is a subset)
//! files     commit -> paths it touched
//! ```
//!
//! A checkout fails when a dirty path is different between the two trees,
//! the same rule git uses to refuse overwriting local changes.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{GitError, GitResult};
use crate::git::{DivergenceReport, ResetMode, Vcs};

pub const REMOTE: &str = "origin";

type History = Vec<u64>;

#[derive(Default)]
struct FakeState {
    next_commit: u64,
    branches: BTreeMap<String, History>,
    server: BTreeMap<String, History>,
    tracking: BTreeMap<String, History>,
    head: Option<String>,
    dirty: BTreeSet<String>,
    staged: BTreeSet<String>,
    stash: Vec<BTreeSet<String>>,
    files: HashMap<u64, BTreeSet<String>>,
    messages: HashMap<u64, String>,
    config: HashMap<String, String>,
    failures: HashSet<String>,
    garbled_counts: bool,
    journal: Vec<String>,
}

/// Scriptable repository with one remote named [`REMOTE`].
pub struct FakeVcs {
    state: Mutex<FakeState>,
}

fn failed(command: impl Into<String>, message: &str) -> GitError {
    GitError::CommandFailed {
        command: command.into(),
        message: message.to_string(),
    }
}

impl FakeState {
    fn commit_on_head(&mut self, paths: BTreeSet<String>, message: &str) -> GitResult<u64> {
        let Some(branch) = self.head.clone() else {
            return Err(failed("git commit", "HEAD detached"));
        };
        self.next_commit += 1;
        let id = self.next_commit;
        self.files.insert(id, paths);
        self.messages.insert(id, message.to_string());
        self.branches.entry(branch).or_default().push(id);
        Ok(id)
    }

    fn head_history(&self) -> GitResult<History> {
        self.head
            .as_ref()
            .and_then(|b| self.branches.get(b))
            .cloned()
            .ok_or_else(|| failed("git rev-parse HEAD", "HEAD is not a branch"))
    }

    fn resolve(&self, rev: &str) -> GitResult<History> {
        let (base, back) = match rev.split_once('~') {
            Some((base, n)) => (
                base,
                n.parse::<usize>()
                    .map_err(|_| failed(format!("git rev-parse {rev}"), "bad revision"))?,
            ),
            None => (rev, 0),
        };
        let mut history = if base == "HEAD" {
            self.head_history()?
        } else if let Some(h) = self.branches.get(base) {
            h.clone()
        } else if let Some(h) = base
            .strip_prefix(&format!("{REMOTE}/"))
            .and_then(|name| self.tracking.get(name))
        {
            h.clone()
        } else {
            return Err(failed(format!("git rev-parse {rev}"), "unknown revision"));
        };
        if back > history.len().saturating_sub(1) {
            return Err(failed(format!("git rev-parse {rev}"), "unknown revision"));
        }
        history.truncate(history.len() - back);
        Ok(history)
    }

    /// Path to the commit that last touched it.
    fn tree(&self, history: &[u64]) -> BTreeMap<String, u64> {
        let mut tree = BTreeMap::new();
        for id in history {
            for path in self.files.get(id).into_iter().flatten() {
                tree.insert(path.clone(), *id);
            }
        }
        tree
    }

    fn touched(&self, commits: impl IntoIterator<Item = u64>) -> BTreeSet<String> {
        commits
            .into_iter()
            .flat_map(|id| self.files.get(&id).cloned().unwrap_or_default())
            .collect()
    }

    fn check_failure(&self, op: &str, arg: &str) -> GitResult<()> {
        if self.failures.contains(op) || self.failures.contains(&format!("{op}:{arg}")) {
            return Err(failed(format!("git {op} {arg}"), "injected failure"));
        }
        Ok(())
    }
}

impl FakeVcs {
    /// `main` with one commit, pushed, and checked out.
    pub fn new() -> Self {
        let fake = Self {
            state: Mutex::new(FakeState::default()),
        };
        {
            let mut s = fake.state();
            s.head = Some("main".to_string());
            s.branches.insert("main".to_string(), Vec::new());
            let _ = s.commit_on_head(BTreeSet::from(["README".to_string()]), "initial");
            let main = s.branches["main"].clone();
            s.server.insert("main".to_string(), main.clone());
            s.tracking.insert("main".to_string(), main);
        }
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(s: &mut FakeState, entry: String) {
        s.journal.push(entry);
    }

    // --- scripting ---

    /// Create `name` at HEAD and check it out.
    pub fn switch_new(&self, name: &str) {
        let mut s = self.state();
        let history = s.head_history().unwrap_or_default();
        s.branches.insert(name.to_string(), history);
        s.head = Some(name.to_string());
    }

    /// Change `path` in the work tree.
    pub fn touch(&self, path: &str) {
        self.state().dirty.insert(path.to_string());
    }

    /// Commit a change to `path` on the current branch.
    pub fn commit_file(&self, path: &str) -> u64 {
        let mut s = self.state();
        s.dirty.remove(path);
        s.staged.remove(path);
        s.commit_on_head(BTreeSet::from([path.to_string()]), &format!("edit {path}"))
            .unwrap_or_default()
    }

    pub fn add_tracking_branch(&self, name: &str) {
        let mut s = self.state();
        let history = s.head_history().unwrap_or_default();
        s.server.insert(name.to_string(), history.clone());
        s.tracking.insert(name.to_string(), history);
    }

    /// Make every call of `op` (or `op:arg`) fail until cleared.
    pub fn fail(&self, op: &str) {
        self.state().failures.insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Make `count_divergence` return output that cannot be parsed.
    pub fn garble_counts(&self) {
        self.state().garbled_counts = true;
    }

    pub fn detach(&self) {
        self.state().head = None;
    }

    // --- inspection ---

    pub fn head(&self) -> Option<String> {
        self.state().head.clone()
    }

    pub fn history(&self, branch: &str) -> Option<Vec<u64>> {
        self.state().branches.get(branch).cloned()
    }

    pub fn tip(&self, branch: &str) -> Option<u64> {
        self.history(branch).and_then(|h| h.last().copied())
    }

    /// Branch as stored on the remote.
    pub fn server_history(&self, branch: &str) -> Option<Vec<u64>> {
        self.state().server.get(branch).cloned()
    }

    pub fn message(&self, commit: u64) -> Option<String> {
        self.state().messages.get(&commit).cloned()
    }

    pub fn files_of(&self, commit: u64) -> BTreeSet<String> {
        self.state().files.get(&commit).cloned().unwrap_or_default()
    }

    pub fn dirty(&self) -> BTreeSet<String> {
        self.state().dirty.clone()
    }

    pub fn staged(&self) -> BTreeSet<String> {
        self.state().staged.clone()
    }

    pub fn stash_depth(&self) -> usize {
        self.state().stash.len()
    }

    /// Mutating calls in order, e.g. `"checkout agb-backup-main"`.
    pub fn journal(&self) -> Vec<String> {
        self.state().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }
}

impl Vcs for FakeVcs {
    fn current_branch(&self) -> GitResult<Option<String>> {
        Ok(self.state().head.clone())
    }

    fn local_branch_exists(&self, name: &str) -> GitResult<bool> {
        Ok(self.state().branches.contains_key(name))
    }

    fn remote_branch_exists(&self, remote: &str, name: &str) -> GitResult<bool> {
        Ok(remote == REMOTE && self.state().tracking.contains_key(name))
    }

    fn is_valid_branch_name(&self, name: &str) -> GitResult<bool> {
        let bad_char = name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\'));
        Ok(!name.is_empty()
            && !bad_char
            && !name.starts_with('-')
            && !name.contains("..")
            && !name.ends_with('/'))
    }

    fn create_branch(&self, name: &str, start: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("branch", name)?;
        if s.branches.contains_key(name) {
            return Err(failed(format!("git branch {name}"), "already exists"));
        }
        let history = s.resolve(start)?;
        s.branches.insert(name.to_string(), history);
        Self::record(&mut s, format!("branch {name} {start}"));
        Ok(())
    }

    fn delete_local_branch(&self, name: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("branch -D", name)?;
        if s.head.as_deref() == Some(name) {
            return Err(failed(format!("git branch -D {name}"), "branch is checked out"));
        }
        if s.branches.remove(name).is_none() {
            return Err(failed(format!("git branch -D {name}"), "branch not found"));
        }
        Self::record(&mut s, format!("branch -D {name}"));
        Ok(())
    }

    fn checkout(&self, branch: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("checkout", branch)?;
        let Some(target) = s.branches.get(branch).cloned() else {
            return Err(failed(format!("git checkout {branch}"), "pathspec did not match"));
        };
        let current = s.head_history()?;
        let (from, to) = (s.tree(&current), s.tree(&target));
        let conflict = s
            .dirty
            .iter()
            .any(|path| from.get(path) != to.get(path));
        if conflict {
            return Err(failed(
                format!("git checkout {branch}"),
                "your local changes would be overwritten by checkout",
            ));
        }
        s.head = Some(branch.to_string());
        Self::record(&mut s, format!("checkout {branch}"));
        Ok(())
    }

    fn unstage_all(&self) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("unstage", "")?;
        s.staged.clear();
        Self::record(&mut s, "unstage".to_string());
        Ok(())
    }

    fn reset(&self, mode: ResetMode, rev: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("reset", rev)?;
        let target = s.resolve(rev)?;
        let current = s.head_history()?;
        let changed: Vec<u64> = current
            .iter()
            .filter(|id| !target.contains(id))
            .chain(target.iter().filter(|id| !current.contains(id)))
            .copied()
            .collect();
        let touched = s.touched(changed);
        match mode {
            ResetMode::Hard => {
                s.dirty.clear();
                s.staged.clear();
            }
            ResetMode::Mixed => {
                s.staged.clear();
                s.dirty.extend(touched);
            }
            ResetMode::Soft => {
                s.staged.extend(touched.iter().cloned());
                s.dirty.extend(touched);
            }
        }
        if let Some(branch) = s.head.clone() {
            s.branches.insert(branch, target);
        }
        Self::record(&mut s, format!("reset {} {rev}", mode.as_flag()));
        Ok(())
    }

    fn stash(&self) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("stash", "")?;
        if !s.dirty.is_empty() {
            let saved = std::mem::take(&mut s.dirty);
            s.stash.push(saved);
            s.staged.clear();
        }
        Self::record(&mut s, "stash".to_string());
        Ok(())
    }

    fn add(&self, pathspec: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("add", pathspec)?;
        let matched: Vec<String> = if pathspec == "." {
            s.dirty.iter().cloned().collect()
        } else {
            s.dirty.iter().filter(|p| *p == pathspec).cloned().collect()
        };
        s.staged.extend(matched);
        Self::record(&mut s, format!("add {pathspec}"));
        Ok(())
    }

    fn commit(&self, message: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("commit", "")?;
        if s.staged.is_empty() {
            return Err(GitError::NothingToCommit);
        }
        let paths = std::mem::take(&mut s.staged);
        for path in &paths {
            s.dirty.remove(path);
        }
        s.commit_on_head(paths, message)?;
        Self::record(&mut s, format!("commit {message}"));
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("push", branch)?;
        if remote != REMOTE {
            return Err(failed(format!("git push {remote}"), "no such remote"));
        }
        let Some(local) = s.branches.get(branch).cloned() else {
            return Err(failed(format!("git push {remote} {branch}"), "src refspec does not match"));
        };
        let fast_forward = s
            .server
            .get(branch)
            .is_none_or(|theirs| local.starts_with(theirs));
        if !force && !fast_forward {
            return Err(failed(format!("git push {remote} {branch}"), "non-fast-forward"));
        }
        s.server.insert(branch.to_string(), local.clone());
        s.tracking.insert(branch.to_string(), local);
        let flag = if force { " --force" } else { "" };
        Self::record(&mut s, format!("push {remote} {branch}{flag}"));
        Ok(())
    }

    fn fetch(&self, remote: &str) -> GitResult<()> {
        let mut s = self.state();
        s.check_failure("fetch", remote)?;
        s.tracking = s.server.clone();
        Self::record(&mut s, format!("fetch {remote}"));
        Ok(())
    }

    fn count_divergence(&self, left: &str, right: &str) -> GitResult<DivergenceReport> {
        let s = self.state();
        if s.garbled_counts {
            return Err(GitError::UnexpectedOutput {
                command: format!("git rev-list --left-right --count {left}...{right}"),
                output: "fatal: ambiguous argument".to_string(),
            });
        }
        let (l, r) = (s.resolve(left)?, s.resolve(right)?);
        let ahead = l.iter().filter(|id| !r.contains(id)).count();
        let behind = r.iter().filter(|id| !l.contains(id)).count();
        Ok(DivergenceReport::new(ahead, behind))
    }

    fn has_uncommitted_changes(&self) -> GitResult<bool> {
        Ok(!self.state().dirty.is_empty())
    }

    fn get_config(&self, key: &str) -> GitResult<Option<String>> {
        Ok(self.state().config.get(key).cloned())
    }

    fn set_config(&self, key: &str, value: &str) -> GitResult<()> {
        let mut s = self.state();
        s.config.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
