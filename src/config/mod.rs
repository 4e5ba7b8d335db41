// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for agb-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. agb.toml (work tree root, optional)
//! 3. --ini FILE (repeatable, required)
//! 4. AGB_* env vars
//! 5. --set section.key=value
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! AGB_BACKUP__REMOTE=backup         → backup.remote = "backup"
//! AGB_BRANCH_INFO__PERSIST=false    → branch_info.persist = false
//! AGB_GLOBAL__OUTPUT_LOG_LEVEL=4    → global.output_log_level = 4
//! ```
//!
//! A loaded `Config` is immutable. Reloading produces a new value; the
//! difference is described by [`Config::diff`].

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{BackupConfig, BranchInfoConfig, GlobalConfig};

/// File name looked up in the work tree root.
pub const CONFIG_FILE_NAME: &str = "agb.toml";

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging options.
    pub global: GlobalConfig,
    /// Backup branch naming and remote.
    pub backup: BackupConfig,
    /// Branch-info persistence.
    pub branch_info: BranchInfoConfig,
}

/// A setting that differs between two configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    BranchPrefix,
    DefaultAutoBackup(bool),
    Remote,
    SyncBeforeBackup,
    BranchInfoStorage,
    Logging,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use agb_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("agb.toml")
    ///     .with_env_prefix("AGB")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.backup.validate()?;
        self.branch_info.validate()
    }

    /// Settings that changed from `self` to `new`.
    #[must_use]
    pub fn diff(&self, new: &Self) -> Vec<ConfigChange> {
        let mut changes = Vec::new();
        if self.backup.branch_prefix != new.backup.branch_prefix {
            changes.push(ConfigChange::BranchPrefix);
        }
        if self.backup.default_auto_backup != new.backup.default_auto_backup {
            changes.push(ConfigChange::DefaultAutoBackup(
                new.backup.default_auto_backup,
            ));
        }
        if self.backup.remote != new.backup.remote {
            changes.push(ConfigChange::Remote);
        }
        if self.backup.sync_before_backup != new.backup.sync_before_backup {
            changes.push(ConfigChange::SyncBeforeBackup);
        }
        if self.branch_info != new.branch_info {
            changes.push(ConfigChange::BranchInfoStorage);
        }
        if self.global != new.global {
            changes.push(ConfigChange::Logging);
        }
        changes
    }

    /// Format configuration options for display, sorted by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        options.insert(
            "global.output_log_level",
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level",
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file",
            self.global
                .log_file
                .as_ref()
                .map_or_else(|| "(unset)".to_string(), |p| p.display().to_string()),
        );
        options.insert("backup.branch_prefix", self.backup.branch_prefix.clone());
        options.insert(
            "backup.default_auto_backup",
            self.backup.default_auto_backup.to_string(),
        );
        options.insert("backup.remote", self.backup.remote.clone());
        options.insert(
            "backup.sync_before_backup",
            self.backup.sync_before_backup.to_string(),
        );
        options.insert("branch_info.persist", self.branch_info.persist.to_string());
        options.insert(
            "branch_info.path",
            self.branch_info.path.display().to_string(),
        );
        options.insert("branch_info.commit", self.branch_info.commit.to_string());

        let max_key_len = options.keys().map(|k| k.len()).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}
