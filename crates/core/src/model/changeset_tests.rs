// SPDX-License-Identifier: MIT

use super::*;
use chrono::TimeZone;

fn sample() -> Changeset {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    Changeset::new(Uuid::new_v4(), "main-portal", "loom/req-1", "apply fix", "loomd", created)
}

#[test]
fn new_changeset_starts_pending() {
    let cs = sample();
    assert_eq!(cs.status, ChangesetStatus::Pending);
    assert_eq!(cs.files_changed, 0);
    assert!(cs.commit_sha.is_none());
}

#[test]
fn approve_records_commit_sha_and_timestamp() {
    let mut cs = sample();
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
    cs.approve("abc123", 3, at);
    assert_eq!(cs.status, ChangesetStatus::Approved);
    assert_eq!(cs.commit_sha.as_deref(), Some("abc123"));
    assert_eq!(cs.files_changed, 3);
    assert_eq!(cs.approved_at, Some(at));
}

#[test]
fn reject_records_reason_and_timestamp() {
    let mut cs = sample();
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
    cs.reject("tests failed", at);
    assert_eq!(cs.status, ChangesetStatus::Rejected);
    assert_eq!(cs.rejection_reason.as_deref(), Some("tests failed"));
    assert_eq!(cs.rejected_at, Some(at));
}

#[test]
fn approve_after_reject_is_a_no_op() {
    let mut cs = sample();
    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 6, 0).unwrap();
    cs.reject("bad", t1);
    cs.approve("abc123", 1, t2);
    assert_eq!(cs.status, ChangesetStatus::Rejected);
    assert!(cs.commit_sha.is_none());
}

#[test]
fn double_reject_keeps_first_timestamp() {
    let mut cs = sample();
    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 6, 0).unwrap();
    cs.reject("first reason", t1);
    cs.reject("second reason", t2);
    assert_eq!(cs.rejected_at, Some(t1));
    assert_eq!(cs.rejection_reason.as_deref(), Some("first reason"));
}
