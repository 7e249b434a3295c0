//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use fedchain_types::{FullSignature, KeyPair, PrivateKey, PublicKey, Signature};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for malformed keys as well as for bad signatures.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Sign a message and bundle the signer's public key with the signature.
pub fn sign_full(message: &[u8], keypair: &KeyPair) -> FullSignature {
    FullSignature::new(keypair.public, sign_message(message, &keypair.private))
}

/// Verify a [`FullSignature`] against the public key it carries.
pub fn verify_full(message: &[u8], signature: &FullSignature) -> bool {
    verify_signature(message, &signature.signature, &signature.public_key)
}
