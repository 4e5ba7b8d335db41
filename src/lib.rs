// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |           backup / config / prompts
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          backup           |
//!              |  Session -> Orchestrator  |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!               store       verify    git
//!           .agbinfo.json  ahead/   Vcs port
//!            / memory      behind   gix/CLI
//!
//!   +-----------------------------------------+
//!   |  config   TOML, AGB_* env, --set        |
//!   +-----------------------------------------+
//!   |  foundation   error, logging            |
//!   +-----------------------------------------+
//! ```

pub mod backup;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
