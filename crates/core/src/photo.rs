//! Photo verification capability for the gym and food challenges.
//!
//! Image analysis is an optional collaborator. The verifier is chosen once at
//! startup; when no analysis backend is available the kiosk uses
//! [`AlwaysApprove`] so the photo challenges stay reachable.

use std::time::Duration;

use async_trait::async_trait;

/// Default upper bound on a single verification call.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Which photo challenge a submission is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Gym,
    Food,
}

impl PhotoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gym => "gym photo",
            Self::Food => "food photo",
        }
    }

    /// Parse the short names used by the kiosk (`gym`, `food`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gym" => Some(Self::Gym),
            "food" => Some(Self::Food),
            _ => None,
        }
    }
}

/// Decides whether a submitted photo satisfies a challenge.
#[async_trait]
pub trait PhotoVerifier: Send + Sync {
    async fn verify(&self, kind: PhotoKind, photo: &[u8]) -> bool;
}

/// Accepts every photo. Used when no image analysis is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

#[async_trait]
impl PhotoVerifier for AlwaysApprove {
    async fn verify(&self, _kind: PhotoKind, _photo: &[u8]) -> bool {
        true
    }
}

/// Run `verifier` with a deadline. A timeout counts as a rejection.
pub async fn verify_with_timeout(
    verifier: &dyn PhotoVerifier,
    kind: PhotoKind,
    photo: &[u8],
    limit: Duration,
) -> bool {
    tokio::time::timeout(limit, verifier.verify(kind, photo))
        .await
        .unwrap_or(false)
}
