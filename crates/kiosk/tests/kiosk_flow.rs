//! Integration tests for the kiosk command layer.
//!
//! Every test drives a [`Kiosk`] backed by a real JSON file in a temp
//! directory with a pinned clock, and checks what was persisted.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use benessere_core::catalog::Catalog;
use benessere_core::clock::FixedClock;
use benessere_core::error::CoreError;
use benessere_core::photo::{PhotoKind, PhotoVerifier};
use benessere_core::types::Timestamp;
use benessere_db::JsonFileStore;
use benessere_kiosk::error::KioskError;
use benessere_kiosk::kiosk::Kiosk;
use chrono::{FixedOffset, TimeZone};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at_day(day: u32, hour: u32) -> Timestamp {
    FixedOffset::west_opt(4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, day, hour, 0, 0)
        .unwrap()
}

fn kiosk_at(dir: &TempDir, now: Timestamp) -> Kiosk {
    Kiosk::new(
        JsonFileStore::new(dir.path().join("loyalty.json")),
        Catalog::default(),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock(now)))
}

struct Never;

#[async_trait]
impl PhotoVerifier for Never {
    async fn verify(&self, _kind: PhotoKind, _photo: &[u8]) -> bool {
        tokio::time::sleep(Duration::from_secs(30)).await;
        true
    }
}

// ---------------------------------------------------------------------------
// Login and referral
// ---------------------------------------------------------------------------

#[test]
fn login_creates_account_and_keeps_first_name() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 9));

    let first = kiosk.login("77712345", Some("Ana"), None).unwrap();
    assert_eq!(first.summary.points, 0);
    assert_eq!(first.summary.name, "Ana");

    let again = kiosk.login("77712345", Some("Impostor"), None).unwrap();
    assert_eq!(again.summary.id, first.summary.id);
    assert_eq!(again.summary.name, "Ana");
}

#[test]
fn referral_at_login_pays_both_once() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 9));

    let ana = kiosk.login("ana", None, None).unwrap().summary;
    let luis = kiosk.login("luis", None, Some(&ana.ref_code)).unwrap();
    assert_eq!(luis.referred_by.as_deref(), Some(ana.id.as_str()));
    assert_eq!(luis.summary.points, 50);
    assert_eq!(kiosk.status("ana").unwrap().points, 50);

    let repeat = kiosk.login("luis", None, Some(&ana.ref_code)).unwrap();
    assert_eq!(repeat.referred_by, None);
    assert_eq!(repeat.summary.points, 50);
}

#[test]
fn invite_code_ignored_for_existing_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 9));

    let ana = kiosk.login("ana", None, None).unwrap().summary;
    let luis = kiosk.login("luis", None, None).unwrap().summary;
    let before = std::fs::read(kiosk.store().path()).unwrap();

    let later = kiosk.login("luis", None, Some(&ana.ref_code)).unwrap();
    assert_eq!(later.referred_by, None);
    assert_eq!(later.summary.points, 0);
    let later = kiosk.login("ana", None, Some(&luis.ref_code)).unwrap();
    assert_eq!(later.referred_by, None);

    assert_eq!(kiosk.status("ana").unwrap().points, 0);
    assert_eq!(kiosk.status("luis").unwrap().points, 0);
    let doc = kiosk.store().load().unwrap();
    assert!(doc.users.values().all(|a| a.referred_by.is_none()));
    assert!(doc.history.is_empty());
    assert_eq!(std::fs::read(kiosk.store().path()).unwrap(), before);
}

#[test]
fn status_of_unknown_handle_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 9));
    assert_matches!(
        kiosk.status("nobody"),
        Err(KioskError::Core(CoreError::NotFound { .. }))
    );
    assert_matches!(kiosk.status("  "), Err(KioskError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// A full day at the kiosk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_day_of_challenges() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10));
    kiosk.login("ana", Some("Ana"), None).unwrap();

    assert_matches!(
        kiosk.claim_steps("ana", 6999),
        Err(KioskError::Core(CoreError::ThresholdNotMet { .. }))
    );
    assert_eq!(kiosk.claim_steps("ana", 7000).unwrap(), 30);
    assert_matches!(
        kiosk.claim_steps("ana", 7000),
        Err(KioskError::Core(CoreError::AlreadyClaimed { .. }))
    );
    assert_eq!(kiosk.claim_water("ana", 2.0).unwrap(), 60);
    assert_matches!(
        kiosk.claim_checkin("ana", "wrong"),
        Err(KioskError::Core(CoreError::InvalidCode))
    );
    assert_eq!(kiosk.claim_checkin("ana", "benessere").unwrap(), 80);

    let photo: &[u8] = b"\xff\xd8\xff\xe0 jpeg";
    assert_eq!(kiosk.claim_photo("ana", PhotoKind::Gym, Some(photo)).await.unwrap(), 110);
    assert_matches!(
        kiosk.claim_photo("ana", PhotoKind::Food, None).await,
        Err(KioskError::Core(CoreError::MissingInput(_)))
    );
    assert_eq!(kiosk.claim_photo("ana", PhotoKind::Food, Some(photo)).await.unwrap(), 140);

    let status = kiosk.status("ana").unwrap();
    assert!(status.today.steps_done && status.today.water_done && status.today.checkin_done);
    assert!(status.today.gym_photo_done && status.today.food_photo_done);

    let reasons: Vec<String> = kiosk
        .history("ana")
        .unwrap()
        .into_iter()
        .map(|h| h.reason)
        .collect();
    assert_eq!(
        reasons,
        vec![
            "steps challenge",
            "water challenge",
            "local check-in",
            "gym photo challenge",
            "food photo challenge"
        ]
    );

    // Next day everything is claimable again.
    let tomorrow = kiosk_at(&dir, at_day(17, 8));
    assert_eq!(tomorrow.claim_steps("ana", 10_000).unwrap(), 170);
}

#[tokio::test]
async fn slow_verifier_times_out_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10))
        .with_verifier(Arc::new(Never))
        .with_verify_timeout(Duration::from_millis(20));
    kiosk.login("ana", None, None).unwrap();

    let photo: &[u8] = b"jpeg";
    assert_matches!(
        kiosk.claim_photo("ana", PhotoKind::Gym, Some(photo)).await,
        Err(KioskError::Core(CoreError::VerificationFailed))
    );
    assert_eq!(kiosk.status("ana").unwrap().points, 0);
}

// ---------------------------------------------------------------------------
// Wheel, redemption, purchases
// ---------------------------------------------------------------------------

#[test]
fn wheel_once_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10));
    kiosk.login("ana", None, None).unwrap();

    kiosk.spin("ana").unwrap();
    let after_first = std::fs::read(kiosk.store().path()).unwrap();
    assert_matches!(
        kiosk.spin("ana"),
        Err(KioskError::Core(CoreError::AlreadySpunToday))
    );
    assert_eq!(std::fs::read(kiosk.store().path()).unwrap(), after_first);
    assert!(!kiosk.status("ana").unwrap().can_spin);

    let tomorrow = kiosk_at(&dir, at_day(17, 10));
    assert!(tomorrow.status("ana").unwrap().can_spin);
    tomorrow.spin("ana").unwrap();
}

#[test]
fn redeem_requires_balance() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10));
    kiosk.login("ana", None, None).unwrap();
    kiosk.claim_steps("ana", 8000).unwrap();

    assert_matches!(
        kiosk.redeem("ana", "Extra topping"),
        Err(KioskError::Core(CoreError::InsufficientPoints { cost: 300, available: 30 }))
    );
    assert_matches!(
        kiosk.redeem("ana", "Pizza"),
        Err(KioskError::Core(CoreError::NotFound { .. }))
    );

    // Top up directly in the store, then redeem.
    kiosk
        .store()
        .update(|doc| -> Result<(), KioskError> {
            let id = benessere_core::account::account_id_for("ana").unwrap();
            doc.account_mut(&id)?.points = 3000;
            Ok(())
        })
        .unwrap();
    assert_eq!(kiosk.redeem("ana", "açaí zero 120g").unwrap(), "RDM-ACAI120");
    assert_eq!(kiosk.status("ana").unwrap().points, 500);

    let doc = kiosk.store().load().unwrap();
    assert_eq!(doc.redemptions.len(), 1);
}

#[test]
fn purchase_streak_issues_coupon() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10));
    kiosk.login("ana", None, None).unwrap();

    assert_eq!(kiosk.purchase("ana", "Açaí Zero 180g").unwrap(), None);
    let code = kiosk.purchase("ana", "Açaí Zero 180g").unwrap().unwrap();
    assert!(code.starts_with("STREAK-20261016-"));
    assert_eq!(kiosk.status("ana").unwrap().coupon_count, 1);
}

#[test]
fn leaderboard_ranks_by_points() {
    let dir = tempfile::tempdir().unwrap();
    let kiosk = kiosk_at(&dir, at_day(16, 10));
    kiosk.login("ana", Some("Ana"), None).unwrap();
    kiosk.login("bea", Some("Bea"), None).unwrap();
    kiosk.login("cris", Some("Cris"), None).unwrap();
    kiosk.claim_steps("bea", 9000).unwrap();
    kiosk.claim_water("bea", 2.5).unwrap();
    kiosk.claim_steps("cris", 9000).unwrap();

    let board = kiosk.leaderboard(2).unwrap();
    let rows: Vec<(usize, &str, i64)> = board
        .iter()
        .map(|r| (r.rank, r.name.as_str(), r.points))
        .collect();
    assert_eq!(rows, vec![(1, "Bea", 60), (2, "Cris", 30)]);
}
