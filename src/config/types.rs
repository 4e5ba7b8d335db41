// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config: GlobalConfig, BackupConfig, BranchInfoConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Placeholder replaced by the working branch name in `branch_prefix`.
pub const BRANCH_PLACEHOLDER: &str = "{branch}";

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stderr output (0-5).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-5).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// Backup branch naming and remote settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Prefix for generated backup branch names, or a template containing `{branch}`.
    pub branch_prefix: String,
    /// `autoBackup` value given to newly created records.
    pub default_auto_backup: bool,
    /// Remote that receives backup pushes and serves restores.
    pub remote: String,
    /// Re-point a stale local backup branch before backing up instead of failing.
    pub sync_before_backup: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "agb-backup-".to_string(),
            default_auto_backup: true,
            remote: "origin".to_string(),
            sync_before_backup: false,
        }
    }
}

impl BackupConfig {
    /// Default backup branch name for `working_branch`.
    #[must_use]
    pub fn backup_branch_name(&self, working_branch: &str) -> String {
        if self.branch_prefix.contains(BRANCH_PLACEHOLDER) {
            self.branch_prefix
                .replace(BRANCH_PLACEHOLDER, working_branch)
        } else {
            format!("{}{working_branch}", self.branch_prefix)
        }
    }

    /// Remote-tracking ref of `backup_branch` on the backup remote.
    #[must_use]
    pub fn remote_ref(&self, backup_branch: &str) -> String {
        format!("{}/{backup_branch}", self.remote)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.trim().is_empty() {
            return Err(invalid("backup", "remote", "must not be empty"));
        }
        if self.branch_prefix.trim().is_empty() {
            return Err(invalid("backup", "branch_prefix", "must not be empty"));
        }
        Ok(())
    }
}

/// Where branch-info records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchInfoConfig {
    /// Keep records in a workspace file; otherwise in memory only.
    pub persist: bool,
    /// File path relative to the work tree root.
    pub path: PathBuf,
    /// Commit the file on the working branch when a backup branch is created.
    pub commit: bool,
}

impl Default for BranchInfoConfig {
    fn default() -> Self {
        Self {
            persist: true,
            path: PathBuf::from(".agbinfo.json"),
            commit: false,
        }
    }
}

impl BranchInfoConfig {
    /// Whether creating a backup branch also commits the record file.
    #[must_use]
    pub const fn commits_file(&self) -> bool {
        self.persist && self.commit
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(invalid("branch_info", "path", "must not be empty"));
        }
        if !is_workspace_relative(&self.path) {
            return Err(invalid(
                "branch_info",
                "path",
                &format!(
                    "'{}' must be relative to the work tree and stay inside it",
                    self.path.display()
                ),
            ));
        }
        Ok(())
    }
}

fn is_workspace_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
