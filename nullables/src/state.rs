//! Nullable node state: a scriptable stand-in for the consensus state
//! machine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use fedchain_messages::{FullServerFault, NodeState, ServerFault, StateError};
use fedchain_types::{FullSignature, PublicKey};

/// A [`NodeState`] whose signer set and failure modes are set by the test.
///
/// Every height is treated as known unless marked otherwise. Executed faults
/// are recorded in arrival order.
#[derive(Default)]
pub struct NullState {
    authorized: Mutex<HashSet<PublicKey>>,
    unknown_heights: Mutex<HashSet<u32>>,
    fail_verification: AtomicBool,
    verify_calls: AtomicUsize,
    server_faults: Mutex<Vec<ServerFault>>,
    full_faults: Mutex<Vec<FullServerFault>>,
}

impl NullState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signers(signers: impl IntoIterator<Item = PublicKey>) -> Self {
        let state = Self::new();
        for key in signers {
            state.authorize(key);
        }
        state
    }

    pub fn authorize(&self, key: PublicKey) {
        self.authorized.lock().unwrap().insert(key);
    }

    pub fn revoke(&self, key: &PublicKey) {
        self.authorized.lock().unwrap().remove(key);
    }

    /// Mark the signer set at `db_height` as known or unknown.
    pub fn set_signer_set_known(&self, db_height: u32, known: bool) {
        let mut unknown = self.unknown_heights.lock().unwrap();
        if known {
            unknown.remove(&db_height);
        } else {
            unknown.insert(db_height);
        }
    }

    /// Make `verify_federated_signature` return an error.
    pub fn set_fail_verification(&self, fail: bool) {
        self.fail_verification.store(fail, Ordering::SeqCst);
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn executed_server_faults(&self) -> Vec<ServerFault> {
        self.server_faults.lock().unwrap().clone()
    }

    pub fn executed_full_faults(&self) -> Vec<FullServerFault> {
        self.full_faults.lock().unwrap().clone()
    }

    pub fn executed_count(&self) -> usize {
        self.server_faults.lock().unwrap().len() + self.full_faults.lock().unwrap().len()
    }
}

impl NodeState for NullState {
    fn signer_set_known(&self, db_height: u32) -> bool {
        !self.unknown_heights.lock().unwrap().contains(&db_height)
    }

    fn verify_federated_signature(
        &self,
        _payload: &[u8],
        signature: &FullSignature,
    ) -> Result<bool, StateError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verification.load(Ordering::SeqCst) {
            return Err(StateError::Other("injected verification failure".to_string()));
        }
        Ok(self
            .authorized
            .lock()
            .unwrap()
            .contains(&signature.public_key))
    }

    fn follower_execute_server_fault(&self, fault: &ServerFault) {
        self.server_faults.lock().unwrap().push(fault.clone());
    }

    fn follower_execute_full_fault(&self, fault: &FullServerFault) {
        self.full_faults.lock().unwrap().push(fault.clone());
    }
}
