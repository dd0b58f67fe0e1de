//! Record store for the loyalty document.
//!
//! The whole dataset lives in one JSON file. Loads tolerate a missing or
//! unparseable file; saves go through a temp file and a rename so a crash
//! never leaves a truncated document behind.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::JsonFileStore;
