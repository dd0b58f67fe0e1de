//! Persisted loyalty document and its records.
//!
//! The whole dataset (accounts, audit history, redemptions) travels as one
//! JSON document. Field names are camelCase on the wire; every record gets its
//! defaults at construction time so nothing is patched up on read.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{AccountId, Points, Timestamp};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The complete persisted dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyDocument {
    #[serde(default)]
    pub users: BTreeMap<AccountId, Account>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub redemptions: Vec<RedemptionEntry>,
}

impl LoyaltyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an account by id.
    pub fn account(&self, id: &str) -> Result<&Account, CoreError> {
        self.users.get(id).ok_or_else(|| account_not_found(id))
    }

    /// Look up an account by id for mutation.
    pub fn account_mut(&mut self, id: &str) -> Result<&mut Account, CoreError> {
        self.users.get_mut(id).ok_or_else(|| account_not_found(id))
    }
}

fn account_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "account",
        id: id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A user's point account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub points: Points,
    pub created_at: Timestamp,
    #[serde(default)]
    pub last_spin_at: Option<Timestamp>,
    #[serde(default)]
    pub daily_state: BTreeMap<NaiveDate, DailyRecord>,
    pub ref_code: String,
    #[serde(default)]
    pub referred_by: Option<AccountId>,
    #[serde(default)]
    pub purchases: Vec<PurchaseEntry>,
    #[serde(default)]
    pub coupons: Vec<CouponEntry>,
}

impl Account {
    /// A fresh zero-balance account.
    pub fn new(id: AccountId, name: String, now: Timestamp) -> Self {
        let ref_code = ref_code_for(&id);
        Self {
            id,
            name,
            points: 0,
            created_at: now,
            last_spin_at: None,
            daily_state: BTreeMap::new(),
            ref_code,
            referred_by: None,
            purchases: Vec::new(),
            coupons: Vec::new(),
        }
    }

    /// Today's challenge flags without creating a record.
    pub fn daily_record(&self, day: NaiveDate) -> DailyRecord {
        self.daily_state.get(&day).copied().unwrap_or_default()
    }
}

/// Invite code: first six characters of the id, upper-cased.
pub fn ref_code_for(id: &str) -> String {
    id.chars().take(6).collect::<String>().to_uppercase()
}

// ---------------------------------------------------------------------------
// Daily record
// ---------------------------------------------------------------------------

/// Challenge completion flags for one user on one calendar day.
///
/// Flags only ever go from `false` to `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRecord {
    pub steps_done: bool,
    pub water_done: bool,
    pub checkin_done: bool,
    pub gym_photo_done: bool,
    pub food_photo_done: bool,
}

// ---------------------------------------------------------------------------
// Append-only entries
// ---------------------------------------------------------------------------

/// Where a coupon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponSource {
    Wheel,
    Redeem,
    Streak,
}

impl CouponSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wheel => "wheel",
            Self::Redeem => "redeem",
            Self::Streak => "streak",
        }
    }
}

/// A coupon granted to a user, redeemed out-of-band at the kiosk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponEntry {
    pub code: String,
    pub issued_at: Timestamp,
    pub source: CouponSource,
}

/// One purchase event on an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEntry {
    pub product: String,
    pub ts: Timestamp,
}

/// Global audit entry for every point movement. Never read back to compute
/// balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub user_id: AccountId,
    pub ts: Timestamp,
    pub delta: Points,
    pub reason: String,
}

/// Global record of a catalog redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionEntry {
    pub user_id: AccountId,
    pub item: String,
    pub ts: Timestamp,
}
