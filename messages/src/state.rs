//! The capability interface through which messages reach live consensus state.
//!
//! The outer process-list state machine owns the federated signer set and the
//! fault-handling logic. Messages never hold that state; they borrow it through
//! this trait for the duration of one call. Implementations are expected to
//! serialize access internally; the message layer adds no locking of its own.

use fedchain_types::{FullSignature, PublicKey};
use thiserror::Error;

use crate::{FullServerFault, ServerFault};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("signer {0:?} is not an authorized federated server")]
    UnknownSigner(PublicKey),

    #[error("{0}")]
    Other(String),
}

/// Narrow view of node state needed by validation and dispatch.
pub trait NodeState {
    /// Whether the federated signer set for `db_height` is known locally.
    ///
    /// When it is not, validation defers instead of rejecting.
    fn signer_set_known(&self, db_height: u32) -> bool;

    /// Check that `signature` is over `payload` and was made by a current
    /// federated server.
    fn verify_federated_signature(
        &self,
        payload: &[u8],
        signature: &FullSignature,
    ) -> Result<bool, StateError>;

    /// Hand an accepted single-signer accusation to the fault handler.
    fn follower_execute_server_fault(&self, fault: &ServerFault);

    /// Hand an accepted aggregate fault to the fault handler.
    fn follower_execute_full_fault(&self, fault: &FullServerFault);
}
