use std::collections::HashSet;
use std::sync::Mutex;

use fedchain_types::{FullSignature, Hash, PublicKey};

use crate::{FullServerFault, NodeState, ServerFault, StateError};

/// Minimal collaborator for unit tests in this crate.
#[derive(Default)]
pub(crate) struct TestState {
    pub authorized: HashSet<PublicKey>,
    pub unknown_heights: HashSet<u32>,
    pub fail_lookup: bool,
    pub log: Mutex<Vec<(&'static str, Hash)>>,
}

impl TestState {
    pub fn authorizing(key: PublicKey) -> Self {
        let mut state = Self::default();
        state.authorized.insert(key);
        state
    }

    pub fn executed(&self) -> Vec<(&'static str, Hash)> {
        self.log.lock().unwrap().clone()
    }
}

impl NodeState for TestState {
    fn signer_set_known(&self, db_height: u32) -> bool {
        !self.unknown_heights.contains(&db_height)
    }

    fn verify_federated_signature(
        &self,
        _payload: &[u8],
        signature: &FullSignature,
    ) -> Result<bool, StateError> {
        if self.fail_lookup {
            return Err(StateError::Other("lookup failed".into()));
        }
        Ok(self.authorized.contains(&signature.public_key))
    }

    fn follower_execute_server_fault(&self, fault: &ServerFault) {
        self.log
            .lock()
            .unwrap()
            .push(("server_fault", fault.server_id()));
    }

    fn follower_execute_full_fault(&self, fault: &FullServerFault) {
        self.log
            .lock()
            .unwrap()
            .push(("full_server_fault", fault.server_id()));
    }
}
