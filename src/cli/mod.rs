// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for agb-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! agb [global options] <command>
//! version | options | inis
//! create | retire | sync | status
//! backup | on-save | load
//! auto-backup {on|off}
//! enable | disable
//! ```

pub mod backup;
pub mod global;


use crate::cli::backup::{AutoBackupArgs, BranchArgs, CreateArgs, LoadArgs};
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Active Git Backup
///
/// Mirrors a working branch onto a shadow backup branch whose remote copy
/// holds the latest uncommitted work.
#[derive(Debug, Parser)]
#[command(
    name = "agb",
    author,
    version,
    about = "Active Git Backup",
    long_about = "agb-rs Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Keeps uncommitted work safe on a remote backup branch.\n\n\
                  Run `agb create` once per working branch, then `agb backup`\n\
                  (or `agb on-save` from an editor hook) to push a snapshot.\n\
                  `agb load` brings the latest snapshot back, e.g. on another\n\
                  machine. See `agb <command> --help` for more information.",
    after_help = "CONFIGURATION:\n\n\
                  agb reads `agb.toml` from the root of the work tree if present.\n\
                  Additional files can be given with --ini and are loaded after it.\n\
                  AGB_<SECTION>__<KEY> environment variables and --set options\n\
                  override both, e.g. AGB_BACKUP__REMOTE=mirror or\n\
                  --set backup.remote=mirror."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the configuration files used.
    Inis,

    /// Creates a backup branch for a working branch.
    Create(CreateArgs),

    /// Removes the backup branch of a working branch.
    Retire(BranchArgs),

    /// Points the backup branch at the working branch's tip again.
    Sync(BranchArgs),

    /// Pushes the uncommitted changes of the checked-out branch.
    Backup,

    /// Backs up the checked-out branch if auto backup is on for it.
    #[command(name = "on-save")]
    OnSave,

    /// Restores the latest backup onto the checked-out branch.
    Load(LoadArgs),

    /// Shows the backup state of a working branch.
    Status(BranchArgs),

    /// Turns backup on save on or off.
    #[command(name = "auto-backup")]
    AutoBackup(AutoBackupArgs),

    /// Enables active git backup for this repository.
    Enable,

    /// Disables active git backup for this repository.
    Disable,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
