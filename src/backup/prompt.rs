// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Questions the workflows put to the user.

/// Interactive collaborator of the backup workflows.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;

    /// Ask for a line of text. `None` when the user gives nothing.
    fn input(&self, message: &str) -> Option<String>;
}

/// Confirms everything and never supplies input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn input(&self, _message: &str) -> Option<String> {
        None
    }
}
