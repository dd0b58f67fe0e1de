use benessere_core::error::CoreError;
use benessere_db::StoreError;

/// Everything a kiosk command can fail with.
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    /// A business rule or lookup failure from the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reading an operator-supplied file (catalog, photo).
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl KioskError {
    /// True for expected outcomes worth showing to the customer as-is.
    pub fn is_business_rule(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_business_rule())
    }
}

/// Convenience type alias for kiosk command results.
pub type KioskResult<T> = Result<T, KioskError>;
