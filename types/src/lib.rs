//! Fundamental types for the fedchain federated ledger.
//!
//! This crate defines the values shared across every other crate in the workspace:
//! content hashes, millisecond timestamps, and the Ed25519 key and signature types
//! that federated servers use to sign protocol messages.

pub mod hash;
pub mod keys;
pub mod time;

pub use hash::Hash;
pub use keys::{FullSignature, KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
