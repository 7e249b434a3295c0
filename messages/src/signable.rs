//! Shared signing behaviour for every signable message type.

use fedchain_crypto::{sign_full, verify_full};
use fedchain_protocol::EncodeError;
use fedchain_types::{FullSignature, KeyPair};

use crate::MessageError;

/// A message whose authenticity rests on a signature over a fixed payload.
///
/// The payload is the type tag plus the body and never includes the
/// signature itself. The marshaled form is `payload ++ signature`, with the
/// signature omitted when the message is unsigned.
pub trait Signable {
    /// The exact bytes a signature covers.
    fn marshal_for_signature(&self) -> Result<Vec<u8>, EncodeError>;

    fn signature(&self) -> Option<&FullSignature>;

    fn marshal_binary(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = self.marshal_for_signature()?;
        if let Some(sig) = self.signature() {
            bytes.extend_from_slice(sig.public_key.as_bytes());
            bytes.extend_from_slice(sig.signature.as_bytes());
        }
        Ok(bytes)
    }
}

/// Sign the message's payload with `keypair`.
///
/// Does not attach the signature; message types expose their own `sign`
/// which builds a new signed value.
pub fn sign_signable<S: Signable + ?Sized>(
    message: &S,
    keypair: &KeyPair,
) -> Result<FullSignature, MessageError> {
    let payload = message.marshal_for_signature()?;
    Ok(sign_full(&payload, keypair))
}

/// Check the attached signature against the key it carries.
///
/// This is a purely cryptographic check. Whether the signer is authorized is
/// a question for [`NodeState`](crate::NodeState).
pub fn verify_signable<S: Signable + ?Sized>(message: &S) -> Result<bool, MessageError> {
    let signature = message.signature().ok_or(MessageError::Unsigned)?;
    let payload = message.marshal_for_signature()?;
    Ok(verify_full(&payload, signature))
}
