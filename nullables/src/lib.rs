//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators (storage backend, consensus node state) sit behind
//! traits. This crate provides test-friendly implementations that:
//! - Keep everything in memory
//! - Can be controlled programmatically (failure injection, signer sets)
//! - Record what was done to them for later assertions
//!
//! Usage: swap real implementations for nullables in tests.

pub mod state;
pub mod store;

pub use state::NullState;
pub use store::NullStore;
