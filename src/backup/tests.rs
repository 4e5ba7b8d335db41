// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::BackupRecord;
use super::lock::{LOCK_FILE_NAME, RepoLock};
use super::testing::FakeVcs;
use super::verify::SyncVerifier;
use crate::error::{AgbError, BackupError, GitError, Precondition};
use crate::git::{DivergenceReport, Vcs};

#[test]
fn test_record_json_shape() {
    let record: BackupRecord =
        serde_json::from_str(r#"{"backupBranchName": "agb-backup-main", "autoBackup": false}"#)
            .unwrap();
    assert_eq!(record, BackupRecord::new("agb-backup-main", false));
    assert_eq!(
        serde_json::to_string(&record).unwrap(),
        r#"{"autoBackup":false,"backupBranchName":"agb-backup-main"}"#
    );
}

#[test]
fn test_in_sync_only_for_expected_pair() {
    let vcs = FakeVcs::new();
    vcs.switch_new("backup");
    vcs.commit_file("snapshot.txt");
    let verifier = SyncVerifier::new(&vcs);

    assert!(verifier.is_in_sync("main", "backup", 0, 1).unwrap());
    assert!(!verifier.is_in_sync("main", "backup", 0, 0).unwrap());
    assert!(!verifier.is_in_sync("backup", "main", 0, 1).unwrap());

    vcs.commit_file("second.txt");
    assert!(!verifier.is_in_sync("main", "backup", 0, 1).unwrap());
    assert_eq!(
        verifier.divergence("main", "backup").unwrap(),
        DivergenceReport::new(0, 2)
    );

    vcs.checkout("main").unwrap();
    vcs.commit_file("local.txt");
    assert_eq!(
        verifier.divergence("main", "backup").unwrap(),
        DivergenceReport::new(1, 2)
    );
    assert!(!verifier.is_in_sync("main", "backup", 1, 1).unwrap());
}

#[test]
fn test_unparseable_counts_are_protocol_errors() {
    let vcs = FakeVcs::new();
    vcs.garble_counts();
    let err = SyncVerifier::new(&vcs)
        .is_in_sync("main", "main", 0, 0)
        .unwrap_err();
    assert!(matches!(
        err.as_backup(),
        Some(BackupError::VcsProtocol { left, right, .. }) if left == "main" && right == "main"
    ));
}

#[test]
fn test_unknown_ref_is_a_git_error() {
    let vcs = FakeVcs::new();
    let err = SyncVerifier::new(&vcs)
        .divergence("main", "missing")
        .unwrap_err();
    assert!(err.as_backup().is_none(), "{err}");
    assert!(matches!(err, AgbError::Git(ref e) if matches!(**e, GitError::CommandFailed { .. })));
}

#[test]
fn test_repo_lock_is_exclusive() {
    let temp = tempfile::tempdir().unwrap();
    let lock = RepoLock::acquire(temp.path()).unwrap();
    assert_eq!(lock.path(), temp.path().join(LOCK_FILE_NAME));

    let err = RepoLock::acquire(temp.path()).unwrap_err();
    assert!(matches!(
        err.precondition(),
        Some(Precondition::OperationInProgress { .. })
    ));

    drop(lock);
    assert!(!temp.path().join(LOCK_FILE_NAME).exists());
    assert!(RepoLock::acquire(temp.path()).is_ok());
}
