// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup command implementations for agb-rs.

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::backup::{BranchStatus, Prompter, Session};
use crate::cli::Command;
use crate::cli::backup::{AutoBackupArgs, BranchArgs, CreateArgs, LoadArgs};
use crate::error::Result;
use crate::git::Vcs;

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Clone, Default)]
pub struct StdinPrompter {
    assume_yes: bool,
    backup_branch: Option<String>,
}

impl StdinPrompter {
    #[must_use]
    pub const fn new(assume_yes: bool, backup_branch: Option<String>) -> Self {
        Self {
            assume_yes,
            backup_branch,
        }
    }

    fn read_answer(message: &str) -> Option<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{message} ").ok()?;
        stderr.flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Self::read_answer(&format!("{message} [y/N]"))
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn input(&self, message: &str) -> Option<String> {
        if let Some(name) = &self.backup_branch {
            return Some(name.clone());
        }
        if self.assume_yes {
            return None;
        }
        Self::read_answer(message).filter(|answer| !answer.is_empty())
    }
}

/// Dispatch one of the repository commands.
///
/// # Errors
///
/// Returns the workflow's error with the command name as context.
pub fn run_backup_command<V: Vcs>(command: &Command, session: &Session<V>) -> Result<()> {
    match command {
        Command::Create(args) => run_create(args, session).context("create failed"),
        Command::Retire(args) => run_retire(args, session).context("retire failed"),
        Command::Sync(args) => run_sync(args, session).context("sync failed"),
        Command::Backup => run_backup(session).context("backup failed"),
        Command::OnSave => run_on_save(session).context("backup on save failed"),
        Command::Load(args) => run_load(args, session).context("load failed"),
        Command::Status(args) => run_status(args, session),
        Command::AutoBackup(args) => run_auto_backup(args, session),
        Command::Enable => {
            session.set_enabled(true)?;
            println!("Active git backup enabled");
            Ok(())
        }
        Command::Disable => {
            session.set_enabled(false)?;
            println!("Active git backup disabled");
            Ok(())
        }
        Command::Version | Command::Options | Command::Inis => Ok(()),
    }
}

fn run_create<V: Vcs>(args: &CreateArgs, session: &Session<V>) -> Result<()> {
    let working = session.working_branch(args.target.branch.as_deref())?;
    let name = session.create(Some(&working), args.name.as_deref())?;
    println!("Created backup branch {name} for {working}");
    Ok(())
}

fn run_retire<V: Vcs>(args: &BranchArgs, session: &Session<V>) -> Result<()> {
    let working = session.working_branch(args.branch.as_deref())?;
    let record = session.retire(Some(&working))?;
    println!(
        "Removed backup branch {} for {working}",
        record.backup_branch_name
    );
    Ok(())
}

fn run_sync<V: Vcs>(args: &BranchArgs, session: &Session<V>) -> Result<()> {
    let working = session.working_branch(args.branch.as_deref())?;
    let name = session.sync(Some(&working))?;
    println!("Backup branch {name} now points at {working}");
    Ok(())
}

fn run_backup<V: Vcs>(session: &Session<V>) -> Result<()> {
    let report = session.backup()?;
    println!(
        "Backed up {} to {}/{} ({})",
        report.working, report.remote, report.backup, report.snapshot_id
    );
    Ok(())
}

fn run_on_save<V: Vcs>(session: &Session<V>) -> Result<()> {
    match session.on_save()? {
        Some(report) => println!(
            "Backed up {} to {}/{} ({})",
            report.working, report.remote, report.backup, report.snapshot_id
        ),
        None => println!("Auto backup is off, nothing to do"),
    }
    Ok(())
}

fn run_load<V: Vcs>(args: &LoadArgs, session: &Session<V>) -> Result<()> {
    let prompter = StdinPrompter::new(args.yes, args.backup_branch.clone());
    if session.load(args.unsaved_documents, &prompter)? {
        println!("Backup loaded");
    } else {
        println!("Load cancelled, nothing changed");
    }
    Ok(())
}

fn run_status<V: Vcs>(args: &BranchArgs, session: &Session<V>) -> Result<()> {
    let status = session.status(args.branch.as_deref())?;
    let remote = session.config().backup.remote;
    for line in format_status(&status, &remote) {
        println!("{line}");
    }
    if !session.is_enabled()? {
        println!("Active git backup is disabled for this repository");
    }
    Ok(())
}

fn run_auto_backup<V: Vcs>(args: &AutoBackupArgs, session: &Session<V>) -> Result<()> {
    let flag = args.state.is_on();
    let word = if flag { "on" } else { "off" };
    if args.all {
        let count = session.set_auto_backup_for_all(flag)?;
        println!("Auto backup {word} for {count} branches");
    } else {
        let working = session.working_branch(args.target.branch.as_deref())?;
        session.set_auto_backup(Some(&working), flag)?;
        println!("Auto backup {word} for {working}");
    }
    Ok(())
}

/// Render a [`BranchStatus`] as aligned `label: value` lines.
#[must_use]
pub fn format_status(status: &BranchStatus, remote: &str) -> Vec<String> {
    let mut lines = vec![
        format!("branch:        {}", status.working),
        format!("state:         {}", status.state()),
    ];
    let Some(record) = &status.record else {
        return lines;
    };
    let backup = &record.backup_branch_name;
    lines.push(format!(
        "backup branch: {backup}{}",
        if status.local_exists { "" } else { " (missing)" }
    ));
    lines.push(format!(
        "auto backup:   {}",
        if record.auto_backup { "on" } else { "off" }
    ));
    if let Some(local) = status.local {
        lines.push(format!("local:         {} vs {backup}: {local}", status.working));
    }
    match status.remote {
        Some(divergence) => lines.push(format!(
            "remote:        {backup} vs {remote}/{backup}: {divergence}"
        )),
        None => lines.push(format!("remote:        {remote}/{backup} not found")),
    }
    lines
}
