//! Redemption ledger: spend points on catalog items for a coupon.

use crate::account::grant_points;
use crate::catalog::RedeemItem;
use crate::error::CoreError;
use crate::models::{CouponEntry, CouponSource, LoyaltyDocument, RedemptionEntry};
use crate::types::Timestamp;

/// Exchange `item.cost` points for the item's coupon code.
///
/// Rejected with `InsufficientPoints` (and no mutation) when the balance is
/// below the cost, so redemption alone never drives a balance negative.
pub fn redeem(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    item: &RedeemItem,
    now: Timestamp,
) -> Result<String, CoreError> {
    if item.cost <= 0 {
        return Err(CoreError::Validation(format!(
            "Redeem item '{}' has a non-positive cost",
            item.name
        )));
    }

    let available = doc.account(user_id)?.points;
    if available < item.cost {
        return Err(CoreError::InsufficientPoints {
            cost: item.cost,
            available,
        });
    }

    grant_points(doc, user_id, -item.cost, &format!("redeem: {}", item.name), now)?;

    doc.account_mut(user_id)?.coupons.push(CouponEntry {
        code: item.coupon.clone(),
        issued_at: now,
        source: CouponSource::Redeem,
    });
    doc.redemptions.push(RedemptionEntry {
        user_id: user_id.to_string(),
        item: item.name.clone(),
        ts: now,
    });

    Ok(item.coupon.clone())
}
