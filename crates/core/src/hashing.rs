//! Truncated SHA-256 digests for account ids and streak coupon codes.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest when deriving an account id.
pub const ACCOUNT_ID_LENGTH: usize = 12;

/// Lower-case hex SHA-256 of `data`, cut to its first `len` characters.
///
/// `len` is clamped to the 64 characters a SHA-256 hex digest has.
pub fn truncated_digest(data: &[u8], len: usize) -> String {
    let mut hex = format!("{:x}", Sha256::digest(data));
    hex.truncate(len.min(64));
    hex
}

/// Canonical form of free-text keys (handles, product names): trimmed,
/// internal whitespace collapsed to single spaces, lower-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
