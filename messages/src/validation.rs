//! Tri-state message validation.

use fedchain_crypto::verify_full;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::{NodeState, Signable};

/// Outcome of validating a message against node state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationResult {
    /// Discard: bad signature, unauthorized signer, or unmarshalable.
    Invalid,
    /// Not enough local state to decide yet. Keep the message and retry later.
    Pending,
    Valid,
}

impl ValidationResult {
    /// Numeric form: `-1` invalid, `0` pending, `1` valid.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Invalid => -1,
            Self::Pending => 0,
            Self::Valid => 1,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    pub fn should_discard(self) -> bool {
        self == Self::Invalid
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalid => "invalid",
            Self::Pending => "pending",
            Self::Valid => "valid",
        })
    }
}

/// Shared validation path for signed messages.
///
/// The local Ed25519 check runs before any state lookup, so a tampered payload
/// is rejected even when the signer set for its height is unknown.
pub(crate) fn validate_signed<M: Signable + ?Sized>(
    kind: &'static str,
    message: &M,
    db_height: u32,
    state: &dyn NodeState,
) -> ValidationResult {
    validate_with(kind, message, db_height, state, true)
}

/// Same as [`validate_signed`] minus the local Ed25519 check, for messages
/// whose `verify_signature` already returned `Ok(true)`.
pub(crate) fn validate_prechecked<M: Signable + ?Sized>(
    kind: &'static str,
    message: &M,
    db_height: u32,
    state: &dyn NodeState,
) -> ValidationResult {
    validate_with(kind, message, db_height, state, false)
}

fn validate_with<M: Signable + ?Sized>(
    kind: &'static str,
    message: &M,
    db_height: u32,
    state: &dyn NodeState,
    check_local: bool,
) -> ValidationResult {
    let payload = match message.marshal_for_signature() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(kind, error = %e, "failed to marshal message for signature check");
            return ValidationResult::Invalid;
        }
    };

    let Some(signature) = message.signature() else {
        debug!(kind, "rejecting unsigned message");
        return ValidationResult::Invalid;
    };

    if check_local && !verify_full(&payload, signature) {
        debug!(kind, "signature does not match payload");
        return ValidationResult::Invalid;
    }

    if !state.signer_set_known(db_height) {
        debug!(kind, db_height, "signer set unknown, deferring");
        return ValidationResult::Pending;
    }

    match state.verify_federated_signature(&payload, signature) {
        Ok(true) => ValidationResult::Valid,
        Ok(false) => {
            debug!(kind, "signer is not a federated server");
            ValidationResult::Invalid
        }
        Err(e) => {
            warn!(kind, error = %e, "federated signature check failed");
            ValidationResult::Invalid
        }
    }
}
