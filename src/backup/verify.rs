// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Divergence checks between two branch tips.
//!
//! ```text
//! count_divergence(A, B) --> (A only, B only)
//!                               |
//!            == (expected_a, expected_b) ?  --> in sync
//! ```

use tracing::debug;

use crate::error::{AgbResult, BackupError, GitError};
use crate::git::{DivergenceReport, Vcs};

/// Compares commit counts through the VCS port.
pub struct SyncVerifier<'a> {
    vcs: &'a dyn Vcs,
}

impl<'a> SyncVerifier<'a> {
    #[must_use]
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self { vcs }
    }

    /// Commits unique to `left` and to `right`.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::VcsProtocol` if git's answer cannot be parsed,
    /// or the `GitError` if git could not compare the two refs at all.
    pub fn divergence(&self, left: &str, right: &str) -> AgbResult<DivergenceReport> {
        self.vcs
            .count_divergence(left, right)
            .map_err(|source| match source {
                GitError::UnexpectedOutput { .. } => BackupError::VcsProtocol {
                    left: left.to_string(),
                    right: right.to_string(),
                    source,
                }
                .into(),
                other => other.into(),
            })
    }

    /// True only if `left` has exactly `expected_left` commits `right` lacks
    /// and `right` has exactly `expected_right` commits `left` lacks.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::divergence`]; a failed comparison is never
    /// reported as in sync.
    pub fn is_in_sync(
        &self,
        left: &str,
        right: &str,
        expected_left: usize,
        expected_right: usize,
    ) -> AgbResult<bool> {
        let report = self.divergence(left, right)?;
        let in_sync = report == DivergenceReport::new(expected_left, expected_right);
        debug!(left, right, %report, in_sync, "Compared branches");
        Ok(in_sync)
    }
}
