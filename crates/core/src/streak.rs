//! Purchase streak bonus.
//!
//! Buying the same product twice in a row earns a coupon. The code is derived
//! from the business day and the product so a repeat within the day yields
//! the same code.

use crate::clock::day_key;
use crate::error::CoreError;
use crate::hashing::{normalize_key, truncated_digest};
use crate::models::{CouponEntry, CouponSource, LoyaltyDocument, PurchaseEntry};
use crate::types::Timestamp;

/// Hex characters of the product digest used in a streak code.
const PRODUCT_DIGEST_LENGTH: usize = 6;

/// Streak coupon code for `product` bought on `now`'s business day,
/// e.g. `STREAK-20261016-1A2B3C`.
pub fn streak_coupon_code(product: &str, now: Timestamp) -> String {
    let digest = truncated_digest(normalize_key(product).as_bytes(), PRODUCT_DIGEST_LENGTH);
    format!(
        "STREAK-{}-{}",
        day_key(&now).format("%Y%m%d"),
        digest.to_uppercase()
    )
}

/// Record a purchase and award a streak coupon when it repeats the previous
/// purchase's product (compared after normalisation).
pub fn purchase_streak_bonus(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    product: &str,
    now: Timestamp,
) -> Result<Option<String>, CoreError> {
    let product = product.trim();
    if product.is_empty() {
        return Err(CoreError::MissingInput("product"));
    }

    let account = doc.account_mut(user_id)?;
    let repeats = account
        .purchases
        .last()
        .is_some_and(|prev| normalize_key(&prev.product) == normalize_key(product));

    account.purchases.push(PurchaseEntry {
        product: product.to_string(),
        ts: now,
    });

    if !repeats {
        return Ok(None);
    }

    let code = streak_coupon_code(product, now);
    account.coupons.push(CouponEntry {
        code: code.clone(),
        issued_at: now,
        source: CouponSource::Streak,
    });
    Ok(Some(code))
}
