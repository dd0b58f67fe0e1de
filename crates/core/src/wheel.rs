//! Daily prize wheel.
//!
//! [`WeightedSampler`] is a reusable cumulative-weight sampler: item `i` is
//! drawn with probability `weight_i / sum(weights)`. The random source is a
//! parameter so tests can seed or script draws.

use rand::Rng;

use crate::account::grant_points;
use crate::catalog::SpinReward;
use crate::clock::same_day;
use crate::error::CoreError;
use crate::models::{Account, CouponEntry, CouponSource, LoyaltyDocument};
use crate::types::Timestamp;

/// History reason for wheel payouts.
pub const WHEEL_REASON: &str = "daily wheel";

// ---------------------------------------------------------------------------
// Weighted sampler
// ---------------------------------------------------------------------------

/// Weighted random choice over a fixed set of items.
#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    items: Vec<T>,
    /// Running totals; `cumulative[i]` is the sum of weights `0..=i`.
    cumulative: Vec<u64>,
}

impl<T> WeightedSampler<T> {
    /// Build a sampler from `(item, weight)` pairs.
    ///
    /// Zero-weight items are kept but never drawn. Fails when the total
    /// weight is zero.
    pub fn new(weighted: impl IntoIterator<Item = (T, u32)>) -> Result<Self, CoreError> {
        let mut items = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0u64;
        for (item, weight) in weighted {
            total += u64::from(weight);
            items.push(item);
            cumulative.push(total);
        }

        if total == 0 {
            return Err(CoreError::Validation(
                "Weighted sampler needs at least one non-zero weight".into(),
            ));
        }
        Ok(Self { items, cumulative })
    }

    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Draw one item.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let ticket = rng.random_range(0..self.total_weight());
        &self.items[self.index_for(ticket)]
    }

    /// Index of the item owning `ticket` in `0..total_weight`.
    ///
    /// First index whose running total exceeds the ticket; zero-weight items
    /// share their predecessor's total and are skipped.
    fn index_for(&self, ticket: u64) -> usize {
        self.cumulative.partition_point(|&c| c <= ticket)
    }
}

impl WeightedSampler<SpinReward> {
    /// Sampler over wheel slices, weighted by each slice's `weight`.
    pub fn for_rewards(rewards: &[SpinReward]) -> Result<Self, CoreError> {
        Self::new(rewards.iter().map(|r| (r.clone(), r.weight)))
    }
}

// ---------------------------------------------------------------------------
// Spinning
// ---------------------------------------------------------------------------

/// True when the account has not spun on `now`'s business day.
pub fn can_spin_today(account: &Account, now: Timestamp) -> bool {
    account
        .last_spin_at
        .map_or(true, |last| !same_day(&last, &now))
}

/// Spin the wheel once for `user_id`.
///
/// Pays out points ("daily wheel") and/or a coupon (source `wheel`) for the
/// drawn slice and stamps `lastSpinAt`, even for empty slices.
pub fn spin<R: Rng + ?Sized>(
    doc: &mut LoyaltyDocument,
    user_id: &str,
    wheel: &WeightedSampler<SpinReward>,
    rng: &mut R,
    now: Timestamp,
) -> Result<SpinReward, CoreError> {
    if !can_spin_today(doc.account(user_id)?, now) {
        return Err(CoreError::AlreadySpunToday);
    }

    let prize = wheel.sample(rng).clone();

    if prize.points != 0 {
        grant_points(doc, user_id, prize.points, WHEEL_REASON, now)?;
    }

    let account = doc.account_mut(user_id)?;
    if let Some(code) = &prize.coupon {
        account.coupons.push(CouponEntry {
            code: code.clone(),
            issued_at: now,
            source: CouponSource::Wheel,
        });
    }
    account.last_spin_at = Some(now);

    Ok(prize)
}
