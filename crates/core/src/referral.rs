//! Referral wiring and the points leaderboard.

use std::cmp::Ordering;

use crate::account::grant_points;
use crate::catalog::REFERRAL_BONUS;
use crate::error::CoreError;
use crate::models::{Account, LoyaltyDocument};
use crate::types::{AccountId, Timestamp};

/// History reason for the newly referred account.
pub const REFERRED_REASON: &str = "referred signup";

/// History reason for the referrer.
pub const REFERRER_REASON: &str = "referral bonus";

/// Link `new_user_id` to the owner of `ref_code` and pay both sides.
///
/// A no-op (returning `Ok(None)`) when the code is blank, the account was
/// already referred, no other account owns the code, or the code is the
/// user's own. Among several owners the earliest-created account wins.
/// Returns the referrer's id when a referral was applied.
pub fn apply_referral(
    doc: &mut LoyaltyDocument,
    new_user_id: &str,
    ref_code: &str,
    now: Timestamp,
) -> Result<Option<AccountId>, CoreError> {
    let wanted = ref_code.trim();
    if wanted.is_empty() || doc.account(new_user_id)?.referred_by.is_some() {
        return Ok(None);
    }

    let referrer_id = doc
        .users
        .values()
        .filter(|a| a.id != new_user_id && a.ref_code.eq_ignore_ascii_case(wanted))
        .min_by(|a, b| creation_order(a, b))
        .map(|a| a.id.clone());

    let Some(referrer_id) = referrer_id else {
        return Ok(None);
    };

    doc.account_mut(new_user_id)?.referred_by = Some(referrer_id.clone());
    grant_points(doc, new_user_id, REFERRAL_BONUS, REFERRED_REASON, now)?;
    grant_points(doc, &referrer_id, REFERRAL_BONUS, REFERRER_REASON, now)?;

    Ok(Some(referrer_id))
}

/// Accounts by points, highest first, at most `top_n` of them.
///
/// Equal balances are ordered by earliest `createdAt`, then id.
pub fn leaderboard(doc: &LoyaltyDocument, top_n: usize) -> Vec<&Account> {
    let mut ranked: Vec<&Account> = doc.users.values().collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| creation_order(a, b)));
    ranked.truncate(top_n);
    ranked
}

fn creation_order(a: &Account, b: &Account) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
