//! `benessere-kiosk` library crate.
//!
//! Wires the loyalty core to the record store, clock and photo verifier.
//! The binary entrypoint lives in `main.rs`; integration tests drive
//! [`kiosk::Kiosk`] directly.

pub mod config;
pub mod error;
pub mod kiosk;
