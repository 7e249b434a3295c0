//! Cryptographic primitives for fedchain.
//!
//! - **Ed25519** for signing and verifying protocol messages
//! - **SHA-256** for message hashes and block key Merkle roots

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{sha256, sha256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_full, sign_message, verify_full, verify_signature};
