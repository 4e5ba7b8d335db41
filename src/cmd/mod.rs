// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   config   options, inis
//!   backup   create, retire, sync, backup, on-save, load,
//!            status, auto-backup, enable, disable
//! ```

pub mod backup;
pub mod config;
