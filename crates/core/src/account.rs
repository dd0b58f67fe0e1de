//! Account manager: handle resolution, point ledger, lookups.

use crate::clock::day_key;
use crate::error::CoreError;
use crate::hashing::{normalize_key, truncated_digest, ACCOUNT_ID_LENGTH};
use crate::models::{Account, DailyRecord, HistoryEntry, LoyaltyDocument};
use crate::types::{AccountId, Points, Timestamp};

/// Derive the stable account id for a user-supplied handle.
///
/// Returns `None` when the handle is blank after normalisation.
pub fn account_id_for(handle: &str) -> Option<AccountId> {
    let normalized = normalize_key(handle);
    if normalized.is_empty() {
        return None;
    }
    Some(truncated_digest(normalized.as_bytes(), ACCOUNT_ID_LENGTH))
}

/// Get or create the account for `handle`.
///
/// A new account gets zero points and `display_name` (falling back to the
/// trimmed handle). An existing account is returned untouched; its name is
/// never overwritten.
pub fn resolve_account<'a>(
    doc: &'a mut LoyaltyDocument,
    handle: &str,
    display_name: Option<&str>,
    now: Timestamp,
) -> Result<&'a mut Account, CoreError> {
    let id = account_id_for(handle)
        .ok_or_else(|| CoreError::Validation("Handle must not be empty".into()))?;

    let account = doc.users.entry(id.clone()).or_insert_with(|| {
        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| handle.trim())
            .to_string();
        Account::new(id, name, now)
    });
    Ok(account)
}

/// Add `delta` (negative for spends) to a balance and record it in history.
///
/// Performs no bound check; callers that spend must check the balance first.
/// Returns the new balance.
pub fn grant_points(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    delta: Points,
    reason: &str,
    now: Timestamp,
) -> Result<Points, CoreError> {
    let account = doc.account_mut(user_id)?;
    account.points += delta;
    let balance = account.points;

    doc.history.push(HistoryEntry {
        user_id: user_id.to_string(),
        ts: now,
        delta,
        reason: reason.to_string(),
    });
    Ok(balance)
}

/// The account's audit entries, oldest first.
pub fn history_for<'a>(doc: &'a LoyaltyDocument, user_id: &str) -> Vec<&'a HistoryEntry> {
    doc.history.iter().filter(|h| h.user_id == user_id).collect()
}

/// Find the account owning an invite code (case-insensitive).
///
/// When truncated ids collide on their prefix, the earliest-created account
/// wins, then the lowest id.
pub fn find_by_ref_code<'a>(doc: &'a LoyaltyDocument, code: &str) -> Option<&'a Account> {
    let wanted = code.trim().to_uppercase();
    if wanted.is_empty() {
        return None;
    }
    doc.users
        .values()
        .filter(|a| a.ref_code.eq_ignore_ascii_case(&wanted))
        .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Read-only snapshot of an account for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub points: Points,
    pub ref_code: String,
    pub today: DailyRecord,
    pub can_spin: bool,
    pub coupon_count: usize,
}

impl AccountSummary {
    pub fn of(account: &Account, now: Timestamp) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            points: account.points,
            ref_code: account.ref_code.clone(),
            today: account.daily_record(day_key(&now)),
            can_spin: crate::wheel::can_spin_today(account, now),
            coupon_count: account.coupons.len(),
        }
    }
}
