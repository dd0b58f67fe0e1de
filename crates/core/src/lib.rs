//! Benessere loyalty core.
//!
//! Pure domain logic for the campus kiosk rewards program: point accounts,
//! daily challenges, the prize wheel, catalog redemptions, referrals, the
//! leaderboard and purchase streaks. Everything operates on an in-memory
//! [`models::LoyaltyDocument`]; persistence lives in `benessere-db`.

pub mod account;
pub mod catalog;
pub mod challenges;
pub mod clock;
pub mod error;
pub mod hashing;
pub mod models;
pub mod photo;
pub mod redemption;
pub mod referral;
pub mod streak;
pub mod types;
pub mod wheel;
