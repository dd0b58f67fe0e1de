//! Kiosk command layer.
//!
//! [`Kiosk`] owns the record store and the run's fixed collaborators (clock,
//! catalog, wheel, photo verifier). Each method is one customer interaction:
//! resolve the account, perform a single core operation and persist the
//! document, or fail without writing anything.

use std::sync::Arc;
use std::time::Duration;

use benessere_core::account::{account_id_for, history_for, resolve_account, AccountSummary};
use benessere_core::catalog::{Catalog, SpinReward};
use benessere_core::challenges::{
    check_photo_claim, claim_checkin, claim_steps, claim_water, record_verified_photo,
};
use benessere_core::clock::{Clock, SystemClock};
use benessere_core::error::CoreError;
use benessere_core::models::{HistoryEntry, LoyaltyDocument};
use benessere_core::photo::{verify_with_timeout, AlwaysApprove, PhotoKind, PhotoVerifier};
use benessere_core::redemption::redeem;
use benessere_core::referral::{apply_referral, leaderboard};
use benessere_core::streak::purchase_streak_bonus;
use benessere_core::types::{AccountId, Points, Timestamp};
use benessere_core::wheel::{spin, WeightedSampler};
use benessere_db::JsonFileStore;

use crate::config::KioskConfig;
use crate::error::{KioskError, KioskResult};

/// Result of a login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub summary: AccountSummary,
    /// Set when this login applied a referral code.
    pub referred_by: Option<AccountId>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedAccount {
    pub rank: usize,
    pub name: String,
    pub points: Points,
}

/// The loyalty kiosk: store plus per-run collaborators.
pub struct Kiosk {
    store: JsonFileStore,
    catalog: Catalog,
    wheel: WeightedSampler<SpinReward>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn PhotoVerifier>,
    verify_timeout: Duration,
}

impl Kiosk {
    /// Build a kiosk with the system clock and the always-approve verifier.
    pub fn new(store: JsonFileStore, catalog: Catalog) -> KioskResult<Self> {
        catalog.validate()?;
        let wheel = WeightedSampler::for_rewards(&catalog.spin_rewards)?;
        Ok(Self {
            store,
            catalog,
            wheel,
            clock: Arc::new(SystemClock::default()),
            verifier: Arc::new(AlwaysApprove),
            verify_timeout: benessere_core::photo::DEFAULT_VERIFY_TIMEOUT,
        })
    }

    /// Build from configuration: store path, offset, catalog, timeout.
    pub fn from_config(config: &KioskConfig) -> KioskResult<Self> {
        let clock = SystemClock::from_offset_hours(config.utc_offset_hours)
            .map_err(|e| KioskError::Config(e.to_string()))?;
        let kiosk = Self::new(JsonFileStore::new(&config.data_path), config.load_catalog()?)?
            .with_clock(Arc::new(clock))
            .with_verify_timeout(config.photo_verify_timeout);
        Ok(kiosk)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PhotoVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_verify_timeout(mut self, limit: Duration) -> Self {
        self.verify_timeout = limit;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &JsonFileStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    /// Resolve (or create) the account for `handle`.
    ///
    /// An invite code only counts on the login that creates the account;
    /// existing accounts ignore it.
    pub fn login(
        &self,
        handle: &str,
        name: Option<&str>,
        ref_code: Option<&str>,
    ) -> KioskResult<LoginOutcome> {
        let now = self.clock.now();
        let outcome = self.store.update(|doc| -> KioskResult<LoginOutcome> {
            let existed = doc.users.contains_key(&known_id(handle)?);
            let id = resolve_account(doc, handle, name, now)?.id.clone();
            let referred_by = match ref_code {
                Some(code) if !existed => apply_referral(doc, &id, code, now)?,
                _ => None,
            };
            Ok(LoginOutcome {
                summary: AccountSummary::of(doc.account(&id)?, now),
                referred_by,
            })
        })?;

        tracing::info!(
            user_id = %outcome.summary.id,
            points = outcome.summary.points,
            referred_by = ?outcome.referred_by,
            "Account resolved",
        );
        Ok(outcome)
    }

    /// Read-only snapshot of an existing account.
    pub fn status(&self, handle: &str) -> KioskResult<AccountSummary> {
        let doc = self.store.load()?;
        let id = known_id(handle)?;
        Ok(AccountSummary::of(doc.account(&id)?, self.clock.now()))
    }

    /// Point history of an existing account, oldest first.
    pub fn history(&self, handle: &str) -> KioskResult<Vec<HistoryEntry>> {
        let doc = self.store.load()?;
        let id = known_id(handle)?;
        doc.account(&id)?;
        Ok(history_for(&doc, &id).into_iter().cloned().collect())
    }

    // -----------------------------------------------------------------------
    // Daily challenges
    // -----------------------------------------------------------------------

    pub fn claim_steps(&self, handle: &str, step_count: u32) -> KioskResult<Points> {
        self.mutate(handle, "steps challenge", |doc, id, now| {
            claim_steps(doc, id, step_count, now)
        })
    }

    pub fn claim_water(&self, handle: &str, liters: f64) -> KioskResult<Points> {
        self.mutate(handle, "water challenge", |doc, id, now| {
            claim_water(doc, id, liters, now)
        })
    }

    pub fn claim_checkin(&self, handle: &str, code: &str) -> KioskResult<Points> {
        self.mutate(handle, "check-in", |doc, id, now| {
            claim_checkin(doc, id, code, &self.catalog, now)
        })
    }

    /// Claim a photo challenge.
    ///
    /// Preconditions are checked against a snapshot, the verifier runs
    /// outside the store's writer lock, and the claim is then recorded with a
    /// fresh precondition check under the lock.
    pub async fn claim_photo(
        &self,
        handle: &str,
        kind: PhotoKind,
        photo: Option<&[u8]>,
    ) -> KioskResult<Points> {
        let now = self.clock.now();
        let id = known_id(handle)?;

        let mut snapshot = self.store.load()?;
        resolve_account(&mut snapshot, handle, None, now)?;
        let photo = check_photo_claim(&snapshot, &id, kind, photo, now)?;

        if !verify_with_timeout(self.verifier.as_ref(), kind, photo, self.verify_timeout).await {
            tracing::warn!(user_id = %id, kind = kind.as_str(), "Photo verification failed");
            return Err(CoreError::VerificationFailed.into());
        }

        self.mutate(handle, kind.as_str(), |doc, id, now| {
            record_verified_photo(doc, id, kind, now)
        })
    }

    // -----------------------------------------------------------------------
    // Wheel, redemption, purchases
    // -----------------------------------------------------------------------

    pub fn spin(&self, handle: &str) -> KioskResult<SpinReward> {
        self.mutate(handle, "wheel spin", |doc, id, now| {
            spin(doc, id, &self.wheel, &mut rand::rng(), now)
        })
    }

    /// Redeem a catalog item by name. Returns the coupon code.
    pub fn redeem(&self, handle: &str, item_name: &str) -> KioskResult<String> {
        let item = self.catalog.redeem_item(item_name)?;
        self.mutate(handle, "redemption", |doc, id, now| redeem(doc, id, item, now))
    }

    /// Record a purchase. Returns a streak coupon when one was earned.
    pub fn purchase(&self, handle: &str, product: &str) -> KioskResult<Option<String>> {
        self.mutate(handle, "purchase", |doc, id, now| {
            purchase_streak_bonus(doc, id, product, now)
        })
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    pub fn leaderboard(&self, top_n: usize) -> KioskResult<Vec<RankedAccount>> {
        let doc = self.store.load()?;
        Ok(leaderboard(&doc, top_n)
            .into_iter()
            .enumerate()
            .map(|(i, a)| RankedAccount {
                rank: i + 1,
                name: a.name.clone(),
                points: a.points,
            })
            .collect())
    }

    /// Resolve the account, run `op` and persist, logging the outcome.
    fn mutate<T: std::fmt::Debug>(
        &self,
        handle: &str,
        action: &'static str,
        op: impl FnOnce(&mut LoyaltyDocument, &str, Timestamp) -> Result<T, CoreError>,
    ) -> KioskResult<T> {
        let now = self.clock.now();
        let result = self.store.update(|doc| -> KioskResult<(AccountId, T)> {
            let id = resolve_account(doc, handle, None, now)?.id.clone();
            let out = op(doc, &id, now)?;
            Ok((id, out))
        });

        match result {
            Ok((id, out)) => {
                tracing::info!(user_id = %id, action, outcome = ?out, "Kiosk action completed");
                Ok(out)
            }
            Err(e) if e.is_business_rule() => {
                tracing::info!(action, reason = %e, "Kiosk action rejected");
                Err(e)
            }
            Err(e) => {
                tracing::error!(action, error = %e, "Kiosk action failed");
                Err(e)
            }
        }
    }
}

/// Account id for `handle`, rejecting blank handles.
fn known_id(handle: &str) -> KioskResult<AccountId> {
    account_id_for(handle)
        .ok_or_else(|| CoreError::Validation("Handle must not be empty".into()).into())
}
