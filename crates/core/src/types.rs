/// Accounts are keyed by a truncated SHA-256 of the normalised handle.
pub type AccountId = String;

/// All timestamps carry the fixed business-day UTC offset.
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;

/// Point balances and deltas.
pub type Points = i64;
