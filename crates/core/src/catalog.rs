//! Fixed reward and redemption catalogs.
//!
//! Catalogs are configuration, not user data: loaded once per process and
//! never mutated afterwards. [`Catalog::default`] carries the built-in kiosk
//! catalog; operators may supply a JSON override via [`Catalog::from_json`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Points;

// ---------------------------------------------------------------------------
// Challenge constants
// ---------------------------------------------------------------------------

/// Minimum steps for the daily steps challenge.
pub const STEPS_THRESHOLD: u32 = 7000;

/// Minimum liters for the daily water challenge.
pub const WATER_THRESHOLD_LITERS: f64 = 2.0;

/// Points for the steps challenge.
pub const STEPS_REWARD: Points = 30;

/// Points for the water challenge.
pub const WATER_REWARD: Points = 30;

/// Points for the kiosk check-in.
pub const CHECKIN_REWARD: Points = 20;

/// Points for either photo challenge.
pub const PHOTO_REWARD: Points = 30;

/// Points each side receives for a referral.
pub const REFERRAL_BONUS: Points = 50;

/// Built-in kiosk check-in code.
pub const DEFAULT_CHECKIN_CODE: &str = "BENESSERE";

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// One slice of the prize wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinReward {
    pub label: String,
    #[serde(default)]
    pub points: Points,
    #[serde(default)]
    pub coupon: Option<String>,
    pub weight: u32,
}

impl SpinReward {
    fn new(label: &str, points: Points, coupon: Option<&str>, weight: u32) -> Self {
        Self {
            label: label.to_string(),
            points,
            coupon: coupon.map(str::to_string),
            weight,
        }
    }
}

/// Something points can be exchanged for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemItem {
    pub name: String,
    pub cost: Points,
    pub coupon: String,
}

impl RedeemItem {
    fn new(name: &str, cost: Points, coupon: &str) -> Self {
        Self {
            name: name.to_string(),
            cost,
            coupon: coupon.to_string(),
        }
    }
}

/// The full set of fixed catalogs for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub spin_rewards: Vec<SpinReward>,
    pub redeem_items: Vec<RedeemItem>,
    #[serde(default = "default_checkin_code")]
    pub checkin_code: String,
}

fn default_checkin_code() -> String {
    DEFAULT_CHECKIN_CODE.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            spin_rewards: vec![
                SpinReward::new("+10 pts", 10, None, 4),
                SpinReward::new("+20 pts", 20, None, 6),
                SpinReward::new("+5 pts", 5, None, 30),
                SpinReward::new("+50 pts", 50, None, 5),
                SpinReward::new("Try again tomorrow", 0, None, 40),
                SpinReward::new("Free topping", 0, Some("TOPPING-FREE"), 5),
                SpinReward::new("10% off juice", 0, Some("JUICE-10"), 5),
                SpinReward::new("Free Açaí Zero 120g", 0, Some("ACAI120-FREE"), 1),
                SpinReward::new("+200 pts", 200, None, 1),
                SpinReward::new("15% off bowl", 0, Some("BOWL-15"), 3),
            ],
            redeem_items: vec![
                RedeemItem::new("Extra topping", 300, "RDM-TOPPING"),
                RedeemItem::new("Jugo Natural 350 ml", 900, "RDM-JUGO350"),
                RedeemItem::new("Açaí Zero 120g", 2500, "RDM-ACAI120"),
                RedeemItem::new("Açaí Zero 180g", 3000, "RDM-ACAI180"),
            ],
            checkin_code: default_checkin_code(),
        }
    }
}

impl Catalog {
    /// Parse and validate an operator-supplied catalog.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let catalog: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Invalid catalog JSON: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the catalog invariants.
    ///
    /// - at least one wheel slice has a non-zero weight
    /// - no wheel slice pays a negative number of points
    /// - every redeem item costs a positive number of points
    /// - redeem item names are unique (case-insensitive)
    /// - the check-in code is not blank
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.spin_rewards.iter().any(|r| r.weight > 0) {
            return Err(CoreError::Validation(
                "At least one spin reward must have a non-zero weight".into(),
            ));
        }

        if let Some(r) = self.spin_rewards.iter().find(|r| r.points < 0) {
            return Err(CoreError::Validation(format!(
                "Spin reward '{}' must not pay negative points",
                r.label
            )));
        }

        let mut seen = HashSet::new();
        for item in &self.redeem_items {
            if item.cost <= 0 {
                return Err(CoreError::Validation(format!(
                    "Redeem item '{}' must cost a positive number of points",
                    item.name
                )));
            }
            if !seen.insert(item.name.to_lowercase()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate redeem item '{}'",
                    item.name
                )));
            }
        }

        if self.checkin_code.trim().is_empty() {
            return Err(CoreError::Validation("Check-in code must not be empty".into()));
        }
        Ok(())
    }

    /// Find a redeem item by name, ignoring case and surrounding whitespace.
    pub fn redeem_item(&self, name: &str) -> Result<&RedeemItem, CoreError> {
        let wanted = name.trim().to_lowercase();
        self.redeem_items
            .iter()
            .find(|i| i.name.to_lowercase() == wanted)
            .ok_or_else(|| CoreError::NotFound {
                entity: "redeem item",
                id: name.trim().to_string(),
            })
    }

    /// Canonical check-in code: trimmed and upper-cased.
    pub fn normalized_checkin_code(&self) -> String {
        self.checkin_code.trim().to_uppercase()
    }
}
