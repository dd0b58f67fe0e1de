use std::path::PathBuf;

/// Failures reaching or writing the backing file.
///
/// An unparseable file is not an error: the store recovers it as an empty
/// document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize loyalty document: {0}")]
    Serialize(#[from] serde_json::Error),
}
