use crate::types::Points;

/// Business-rule and domain failures raised by the loyalty core.
///
/// Every operation checks its preconditions before mutating anything, so
/// any of these leaves the document exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("The {challenge} challenge was already claimed today")]
    AlreadyClaimed { challenge: &'static str },

    #[error("The {challenge} challenge needs at least {required}, got {actual}")]
    ThresholdNotMet {
        challenge: &'static str,
        required: String,
        actual: String,
    },

    #[error("Invalid check-in code")]
    InvalidCode,

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Photo verification failed")]
    VerificationFailed,

    #[error("The wheel was already spun today")]
    AlreadySpunToday,

    #[error("Insufficient points: need {cost}, have {available}")]
    InsufficientPoints { cost: Points, available: Points },
}

impl CoreError {
    /// True for expected, displayable outcomes of a user action (as opposed
    /// to lookups or configuration problems).
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::NotFound { .. } | Self::Validation(_))
    }
}
