// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Real repositories for integration tests.
//!
//! ```text
//! <temp>/remote.git   bare, plays the backup remote "origin"
//! <temp>/work         clone with main + feature-1 (checked out)
//! <temp>/<name>       further clones via Fixture::clone_remote
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `cwd` and return trimmed stdout. Panics on failure.
pub fn git(args: &[&str], cwd: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(path: &Path) {
    git(&["config", "user.email", "test@example.com"], path);
    git(&["config", "user.name", "Test"], path);
    git(&["config", "commit.gpgsign", "false"], path);
}

pub struct Fixture {
    pub temp: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
}

impl Fixture {
    /// Work tree on `feature-1`, with `main` and `feature-1` pushed.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let remote = temp.path().join("remote.git");
        let work = temp.path().join("work");
        std::fs::create_dir_all(&remote).expect("create remote dir");
        std::fs::create_dir_all(&work).expect("create work dir");

        git(&["init", "--bare", "--quiet"], &remote);
        git(&["symbolic-ref", "HEAD", "refs/heads/main"], &remote);

        git(&["init", "--quiet"], &work);
        git(&["symbolic-ref", "HEAD", "refs/heads/main"], &work);
        configure_identity(&work);
        std::fs::write(work.join("README.md"), "# Test\n").expect("write README");
        git(&["add", "."], &work);
        git(&["commit", "--quiet", "-m", "Initial commit"], &work);

        let url = remote.to_string_lossy().into_owned();
        git(&["remote", "add", "origin", &url], &work);
        git(&["push", "--quiet", "-u", "origin", "main"], &work);
        git(&["checkout", "--quiet", "-b", "feature-1"], &work);
        git(&["push", "--quiet", "-u", "origin", "feature-1"], &work);

        Self { temp, remote, work }
    }

    /// Fresh clone of the remote with `branch` checked out.
    pub fn clone_remote(&self, name: &str, branch: &str) -> PathBuf {
        let url = self.remote.to_string_lossy().into_owned();
        git(&["clone", "--quiet", &url, name], self.temp.path());
        let path = self.temp.path().join(name);
        configure_identity(&path);
        git(&["checkout", "--quiet", branch], &path);
        path
    }

    pub fn write(&self, file: &str, content: &str) {
        std::fs::write(self.work.join(file), content).expect("write file");
    }

    pub fn rev(&self, rev: &str) -> String {
        git(&["rev-parse", rev], &self.work)
    }

    pub fn head(&self) -> String {
        git(&["rev-parse", "--abbrev-ref", "HEAD"], &self.work)
    }

    pub fn porcelain(&self) -> String {
        git(&["status", "--porcelain"], &self.work)
    }
}
