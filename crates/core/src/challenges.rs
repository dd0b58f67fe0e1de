//! Daily challenge tracker.
//!
//! Each (user, day) pair has five independent flags. A flag moves from
//! pending to done once and stays done for the rest of that day; the next
//! calendar day starts from a fresh all-pending record.
//!
//! Every claim validates first and mutates last, so a rejected claim does not
//! even create the day's record.

use std::time::Duration;

use crate::account::grant_points;
use crate::catalog::{
    Catalog, CHECKIN_REWARD, PHOTO_REWARD, STEPS_REWARD, STEPS_THRESHOLD, WATER_REWARD,
    WATER_THRESHOLD_LITERS,
};
use crate::clock::day_key;
use crate::error::CoreError;
use crate::models::{Account, DailyRecord, LoyaltyDocument};
use crate::photo::{verify_with_timeout, PhotoKind, PhotoVerifier};
use crate::types::{Points, Timestamp};

/// The five daily challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Challenge {
    Steps,
    Water,
    Checkin,
    GymPhoto,
    FoodPhoto,
}

impl Challenge {
    pub fn name(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Water => "water",
            Self::Checkin => "check-in",
            Self::GymPhoto => PhotoKind::Gym.as_str(),
            Self::FoodPhoto => PhotoKind::Food.as_str(),
        }
    }

    /// History reason recorded with the payout.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Steps => "steps challenge",
            Self::Water => "water challenge",
            Self::Checkin => "local check-in",
            Self::GymPhoto => "gym photo challenge",
            Self::FoodPhoto => "food photo challenge",
        }
    }

    pub fn reward(self) -> Points {
        match self {
            Self::Steps => STEPS_REWARD,
            Self::Water => WATER_REWARD,
            Self::Checkin => CHECKIN_REWARD,
            Self::GymPhoto | Self::FoodPhoto => PHOTO_REWARD,
        }
    }

    pub fn is_done(self, record: &DailyRecord) -> bool {
        match self {
            Self::Steps => record.steps_done,
            Self::Water => record.water_done,
            Self::Checkin => record.checkin_done,
            Self::GymPhoto => record.gym_photo_done,
            Self::FoodPhoto => record.food_photo_done,
        }
    }

    fn mark_done(self, record: &mut DailyRecord) {
        let flag = match self {
            Self::Steps => &mut record.steps_done,
            Self::Water => &mut record.water_done,
            Self::Checkin => &mut record.checkin_done,
            Self::GymPhoto => &mut record.gym_photo_done,
            Self::FoodPhoto => &mut record.food_photo_done,
        };
        *flag = true;
    }
}

impl From<PhotoKind> for Challenge {
    fn from(kind: PhotoKind) -> Self {
        match kind {
            PhotoKind::Gym => Self::GymPhoto,
            PhotoKind::Food => Self::FoodPhoto,
        }
    }
}

/// Today's record for `account`, created all-pending if absent.
pub fn ensure_today(account: &mut Account, now: Timestamp) -> &mut DailyRecord {
    account.daily_state.entry(day_key(&now)).or_default()
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Claim the steps challenge. Returns the new balance.
pub fn claim_steps(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    step_count: u32,
    now: Timestamp,
) -> Result<Points, CoreError> {
    ensure_pending(doc, user_id, Challenge::Steps, now)?;
    if step_count < STEPS_THRESHOLD {
        return Err(CoreError::ThresholdNotMet {
            challenge: Challenge::Steps.name(),
            required: format!("{STEPS_THRESHOLD} steps"),
            actual: format!("{step_count} steps"),
        });
    }
    complete(doc, user_id, Challenge::Steps, now)
}

/// Claim the water challenge. Returns the new balance.
pub fn claim_water(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    liters: f64,
    now: Timestamp,
) -> Result<Points, CoreError> {
    ensure_pending(doc, user_id, Challenge::Water, now)?;
    // NaN never meets the threshold.
    if !(liters >= WATER_THRESHOLD_LITERS) {
        return Err(CoreError::ThresholdNotMet {
            challenge: Challenge::Water.name(),
            required: format!("{WATER_THRESHOLD_LITERS:.1} L"),
            actual: format!("{liters:.1} L"),
        });
    }
    complete(doc, user_id, Challenge::Water, now)
}

/// Claim the kiosk check-in with the scanned code. Returns the new balance.
pub fn claim_checkin(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    code: &str,
    catalog: &Catalog,
    now: Timestamp,
) -> Result<Points, CoreError> {
    ensure_pending(doc, user_id, Challenge::Checkin, now)?;
    if code.trim().to_uppercase() != catalog.normalized_checkin_code() {
        return Err(CoreError::InvalidCode);
    }
    complete(doc, user_id, Challenge::Checkin, now)
}

/// Claim a photo challenge. Returns the new balance.
///
/// The verifier call is bounded by `limit`; running out of time is a failed
/// verification.
pub async fn claim_photo_challenge(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    kind: PhotoKind,
    photo: Option<&[u8]>,
    verifier: &dyn PhotoVerifier,
    limit: Duration,
    now: Timestamp,
) -> Result<Points, CoreError> {
    let photo = check_photo_claim(doc, user_id, kind, photo, now)?;
    if !verify_with_timeout(verifier, kind, photo, limit).await {
        return Err(CoreError::VerificationFailed);
    }
    record_verified_photo(doc, user_id, kind, now)
}

/// Preconditions of a photo claim: not yet claimed today, photo present.
///
/// Lets a caller reject early before running a slow verifier outside its
/// write lock.
pub fn check_photo_claim<'p>(
    doc: &LoyaltyDocument,
    user_id: &str,
    kind: PhotoKind,
    photo: Option<&'p [u8]>,
    now: Timestamp,
) -> Result<&'p [u8], CoreError> {
    ensure_pending(doc, user_id, kind.into(), now)?;
    photo
        .filter(|bytes| !bytes.is_empty())
        .ok_or(CoreError::MissingInput("photo"))
}

/// Complete a photo claim whose photo already passed verification.
///
/// Re-checks the day's flag, since the document may have changed while the
/// verifier ran.
pub fn record_verified_photo(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    kind: PhotoKind,
    now: Timestamp,
) -> Result<Points, CoreError> {
    let challenge = Challenge::from(kind);
    ensure_pending(doc, user_id, challenge, now)?;
    complete(doc, user_id, challenge, now)
}

/// Fail with `AlreadyClaimed` if the flag is set, without creating a record.
fn ensure_pending(
    doc: &LoyaltyDocument,
    user_id: &str,
    challenge: Challenge,
    now: Timestamp,
) -> Result<(), CoreError> {
    let today = doc.account(user_id)?.daily_record(day_key(&now));
    if challenge.is_done(&today) {
        return Err(CoreError::AlreadyClaimed {
            challenge: challenge.name(),
        });
    }
    Ok(())
}

fn complete(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    challenge: Challenge,
    now: Timestamp,
) -> Result<Points, CoreError> {
    let account = doc.account_mut(user_id)?;
    challenge.mark_done(ensure_today(account, now));
    grant_points(doc, user_id, challenge.reward(), challenge.reason(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::resolve_account;
    use crate::photo::AlwaysApprove;
    use crate::test_support::{at, at_day};
    use assert_matches::assert_matches;

    struct Reject;

    #[async_trait::async_trait]
    impl PhotoVerifier for Reject {
        async fn verify(&self, _kind: PhotoKind, _photo: &[u8]) -> bool {
            false
        }
    }

    fn doc_with_user() -> (LoyaltyDocument, String) {
        let mut doc = LoyaltyDocument::new();
        let id = resolve_account(&mut doc, "ana", None, at(8)).unwrap().id.clone();
        (doc, id)
    }

    // -- ensure_today --------------------------------------------------------

    #[test]
    fn ensure_today_creates_once_per_day() {
        let (mut doc, id) = doc_with_user();
        let acct = doc.account_mut(&id).unwrap();
        ensure_today(acct, at(9)).water_done = true;
        assert!(ensure_today(acct, at(20)).water_done);
        assert_eq!(*ensure_today(acct, at_day(17, 9)), DailyRecord::default());
        assert_eq!(acct.daily_state.len(), 2);
    }

    // -- Steps ---------------------------------------------------------------

    #[test]
    fn steps_below_threshold_grants_nothing() {
        let (mut doc, id) = doc_with_user();
        let before = doc.clone();
        assert_matches!(
            claim_steps(&mut doc, &id, 6999, at(10)),
            Err(CoreError::ThresholdNotMet { .. })
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn steps_claim_once_per_day() {
        let (mut doc, id) = doc_with_user();
        assert_eq!(claim_steps(&mut doc, &id, 7000, at(10)).unwrap(), 30);

        let before = doc.clone();
        assert_matches!(
            claim_steps(&mut doc, &id, 12000, at(18)),
            Err(CoreError::AlreadyClaimed { challenge: "steps" })
        );
        assert_eq!(doc, before);

        // A new day resets the flag.
        assert_eq!(claim_steps(&mut doc, &id, 7000, at_day(17, 10)).unwrap(), 60);
    }

    #[test]
    fn steps_history_reason() {
        let (mut doc, id) = doc_with_user();
        claim_steps(&mut doc, &id, 9000, at(10)).unwrap();
        let last = doc.history.last().unwrap();
        assert_eq!(last.reason, "steps challenge");
        assert_eq!(last.delta, 30);
    }

    // -- Water ---------------------------------------------------------------

    #[test]
    fn water_threshold() {
        let (mut doc, id) = doc_with_user();
        assert_matches!(
            claim_water(&mut doc, &id, 1.9, at(10)),
            Err(CoreError::ThresholdNotMet { .. })
        );
        assert_matches!(
            claim_water(&mut doc, &id, f64::NAN, at(10)),
            Err(CoreError::ThresholdNotMet { .. })
        );
        assert_eq!(claim_water(&mut doc, &id, 2.0, at(10)).unwrap(), 30);
        assert_matches!(
            claim_water(&mut doc, &id, 3.0, at(11)),
            Err(CoreError::AlreadyClaimed { .. })
        );
    }

    #[test]
    fn flags_are_independent() {
        let (mut doc, id) = doc_with_user();
        claim_water(&mut doc, &id, 2.5, at(10)).unwrap();
        claim_steps(&mut doc, &id, 8000, at(10)).unwrap();
        let today = doc.account(&id).unwrap().daily_record(day_key(&at(10)));
        assert!(today.water_done && today.steps_done);
        assert!(!today.checkin_done);
    }

    // -- Check-in ------------------------------------------------------------

    #[test]
    fn checkin_code_is_case_insensitive() {
        let (mut doc, id) = doc_with_user();
        let catalog = Catalog::default();
        assert_matches!(
            claim_checkin(&mut doc, &id, "WRONG", &catalog, at(10)),
            Err(CoreError::InvalidCode)
        );
        assert_eq!(
            claim_checkin(&mut doc, &id, "  benessere ", &catalog, at(10)).unwrap(),
            20
        );
        assert_matches!(
            claim_checkin(&mut doc, &id, "BENESSERE", &catalog, at(11)),
            Err(CoreError::AlreadyClaimed { .. })
        );
    }

    // -- Photos --------------------------------------------------------------

    #[tokio::test]
    async fn photo_requires_input() {
        let (mut doc, id) = doc_with_user();
        let before = doc.clone();
        let limit = Duration::from_secs(1);

        let result =
            claim_photo_challenge(&mut doc, &id, PhotoKind::Gym, None, &AlwaysApprove, limit, at(10))
                .await;
        assert_matches!(result, Err(CoreError::MissingInput("photo")));

        let empty: &[u8] = &[];
        let result = claim_photo_challenge(
            &mut doc,
            &id,
            PhotoKind::Gym,
            Some(empty),
            &AlwaysApprove,
            limit,
            at(10),
        )
        .await;
        assert_matches!(result, Err(CoreError::MissingInput(_)));
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn photo_rejected_by_verifier() {
        let (mut doc, id) = doc_with_user();
        let result = claim_photo_challenge(
            &mut doc,
            &id,
            PhotoKind::Food,
            Some(&b"jpeg"[..]),
            &Reject,
            Duration::from_secs(1),
            at(10),
        )
        .await;
        assert_matches!(result, Err(CoreError::VerificationFailed));
        assert_eq!(doc.account(&id).unwrap().points, 0);
    }

    #[tokio::test]
    async fn photo_kinds_claim_separately() {
        let (mut doc, id) = doc_with_user();
        let limit = Duration::from_secs(1);
        let photo: &[u8] = b"jpeg";

        let gym = claim_photo_challenge(
            &mut doc, &id, PhotoKind::Gym, Some(photo), &AlwaysApprove, limit, at(10),
        )
        .await;
        assert_eq!(gym.unwrap(), 30);

        let food = claim_photo_challenge(
            &mut doc, &id, PhotoKind::Food, Some(photo), &AlwaysApprove, limit, at(10),
        )
        .await;
        assert_eq!(food.unwrap(), 60);

        let again = claim_photo_challenge(
            &mut doc, &id, PhotoKind::Gym, Some(photo), &AlwaysApprove, limit, at(12),
        )
        .await;
        assert_matches!(again, Err(CoreError::AlreadyClaimed { challenge: "gym photo" }));
    }

    #[test]
    fn verified_photo_recheck_rejects_double_claim() {
        let (mut doc, id) = doc_with_user();
        assert_eq!(record_verified_photo(&mut doc, &id, PhotoKind::Food, at(10)).unwrap(), 30);
        assert_matches!(
            record_verified_photo(&mut doc, &id, PhotoKind::Food, at(11)),
            Err(CoreError::AlreadyClaimed { .. })
        );
        let photo: &[u8] = b"jpeg";
        assert_matches!(
            check_photo_claim(&doc, &id, PhotoKind::Food, Some(photo), at(12)),
            Err(CoreError::AlreadyClaimed { .. })
        );
        assert_eq!(
            check_photo_claim(&doc, &id, PhotoKind::Gym, Some(photo), at(12)).unwrap(),
            photo
        );
    }
}
