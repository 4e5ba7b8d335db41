// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git operations module.
//!
//! ```text
//!            vcs.rs (Vcs port trait)
//!                    |
//!                    v
//!            repo.rs (GitRepo)
//!                    |
//!      ,-------------+-------------,
//!      |      backend (traits)     |
//!      '-----+---------------+-----'
//!            |               |
//!            v               v
//!       GixBackend      ShellBackend
//!       .branch         .checkout/.commit
//!       .refs           .push/.fetch/.reset
//!       .status         .rev-list/.config
//! ```
//!
//! **`GixBackend`**: pure Rust, no subprocess, read-only.
//! **`ShellBackend`**: git CLI for every write, so hooks and credentials apply.

pub mod backend;
pub mod repo;
pub mod vcs;

pub use repo::GitRepo;
pub use vcs::{DivergenceReport, ResetMode, Vcs};
