// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup command arguments.
//!
//! # Subcommands
//!
//! ```text
//! create [--branch B] [--name N]   → link B to a new backup branch
//! retire [--branch B]              → unlink, delete local backup branch
//! sync   [--branch B]              → recreate backup branch at B's tip
//! backup                           → snapshot to <remote>/<backup>
//! on-save                          → backup if auto backup is on
//! load [--backup-branch N] [--yes] [--unsaved-documents]
//! status [--branch B]
//! auto-backup {on|off} [--branch B | --all]
//! ```

use clap::{Args, ValueEnum};

/// Selects the working branch.
#[derive(Debug, Clone, Default, Args)]
pub struct BranchArgs {
    /// Working branch (default: the checked-out branch).
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub branch: Option<String>,
}

/// Arguments for the `create` command.
#[derive(Debug, Clone, Default, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub target: BranchArgs,

    /// Backup branch name (default: backup.branch_prefix + branch).
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,
}

/// Arguments for the `load` command.
#[derive(Debug, Clone, Default, Args)]
pub struct LoadArgs {
    /// Backup branch to load from when the branch has no record.
    #[arg(long = "backup-branch", value_name = "NAME")]
    pub backup_branch: Option<String>,

    /// Continue without asking when the backup is out of sync.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// The editor has unsaved documents; refuse to load.
    #[arg(long = "unsaved-documents")]
    pub unsaved_documents: bool,
}

/// Arguments for the `auto-backup` command.
#[derive(Debug, Clone, Args)]
pub struct AutoBackupArgs {
    /// Whether saving triggers a backup.
    #[arg(value_enum)]
    pub state: Toggle,

    #[command(flatten)]
    pub target: BranchArgs,

    /// Apply to every recorded branch.
    #[arg(short = 'a', long, conflicts_with = "branch")]
    pub all: bool,
}

/// On/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}
