//! Fault tally: accumulates matching accusations from distinct signers.
//!
//! Signatures are held per signer key, so re-delivered or replayed
//! accusations never inflate the count. The aggregate signature list is
//! emitted in key order, which makes it independent of arrival order.

use std::collections::{BTreeMap, HashMap};

use fedchain_messages::{FaultKey, FullServerFault, ServerFault, Signable};
use fedchain_types::{FullSignature, KeyPair, PublicKey, Timestamp};
use tracing::debug;

use crate::ConsensusError;

/// Upper bound on distinct signers held for one fault tuple.
pub const MAX_SIGNERS_PER_FAULT: usize = 256;

#[derive(Debug, Default)]
pub struct FaultTally {
    entries: HashMap<FaultKey, BTreeMap<PublicKey, FullSignature>>,
}

impl FaultTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accusation and return the number of distinct signers now
    /// held for its fault tuple.
    ///
    /// The caller is expected to have validated the fault already.
    pub fn record(&mut self, fault: &ServerFault) -> Result<usize, ConsensusError> {
        let signature = fault
            .signature()
            .copied()
            .ok_or(ConsensusError::UnsignedFault)?;
        let key = fault.key();
        let signers = self.entries.entry(key).or_default();

        if signers.contains_key(&signature.public_key) {
            return Ok(signers.len());
        }
        if signers.len() >= MAX_SIGNERS_PER_FAULT {
            return Err(ConsensusError::TallyFull {
                server_id: key.server_id.to_hex(),
                db_height: key.db_height,
                height: key.height,
                max: MAX_SIGNERS_PER_FAULT,
            });
        }
        signers.insert(signature.public_key, signature);
        debug!(
            server_id = %key.server_id,
            vm_index = key.vm_index,
            db_height = key.db_height,
            height = key.height,
            signers = signers.len(),
            "recorded server fault"
        );
        Ok(signers.len())
    }

    pub fn signature_count(&self, key: &FaultKey) -> usize {
        self.entries.get(key).map_or(0, BTreeMap::len)
    }

    /// The collected signatures for `key`, ordered by signer key.
    pub fn signatures(&self, key: &FaultKey) -> Vec<FullSignature> {
        self.entries
            .get(key)
            .map(|s| s.values().copied().collect())
            .unwrap_or_default()
    }

    /// Build and sign the aggregate fault for `key`.
    ///
    /// Returns `None` when nothing has been recorded for the tuple. Whether
    /// the count is sufficient is for the caller to judge.
    pub fn build_full_fault(
        &self,
        key: &FaultKey,
        timestamp: Timestamp,
        keypair: &KeyPair,
    ) -> Result<Option<FullServerFault>, ConsensusError> {
        let Some(signers) = self.entries.get(key) else {
            return Ok(None);
        };
        if signers.is_empty() {
            return Ok(None);
        }
        let full = FullServerFault::new(timestamp, key.server_id, key.vm_index, key.db_height, key.height)
            .with_signature_list(signers.values().copied())
            .sign(keypair)?;
        Ok(Some(full))
    }

    /// Forget a tuple, typically once its full fault has been issued.
    pub fn remove(&mut self, key: &FaultKey) -> Vec<FullSignature> {
        self.entries
            .remove(key)
            .map(|s| s.into_values().collect())
            .unwrap_or_default()
    }

    /// Drop tallies for directory-block heights below `db_height`.
    /// Returns the number of tuples removed.
    pub fn prune_below(&mut self, db_height: u32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.db_height >= db_height);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_signatures(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedchain_crypto::{keypair_from_seed, verify_full};
    use fedchain_types::Hash;

    fn fault(seed: u8, db_height: u32) -> ServerFault {
        ServerFault::new(Timestamp::from_millis(1_000 + seed as u64), Hash::new([7; 32]), 2, db_height, 9)
            .sign(&keypair_from_seed(&[seed; 32]))
            .unwrap()
    }

    #[test]
    fn new_tally_is_empty() {
        let tally = FaultTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.total_signatures(), 0);
    }

    #[test]
    fn distinct_signers_accumulate() {
        let mut tally = FaultTally::new();
        assert_eq!(tally.record(&fault(1, 50)).unwrap(), 1);
        assert_eq!(tally.record(&fault(2, 50)).unwrap(), 2);
        assert_eq!(tally.record(&fault(3, 50)).unwrap(), 3);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.signature_count(&fault(1, 50).key()), 3);
    }

    #[test]
    fn redelivery_does_not_inflate() {
        let mut tally = FaultTally::new();
        let f = fault(1, 50);
        tally.record(&f).unwrap();
        assert_eq!(tally.record(&f).unwrap(), 1);
        assert_eq!(tally.total_signatures(), 1);
    }

    #[test]
    fn unsigned_fault_rejected() {
        let mut tally = FaultTally::new();
        let f = ServerFault::new(Timestamp::from_millis(1), Hash::ZERO, 0, 1, 1);
        assert!(matches!(tally.record(&f), Err(ConsensusError::UnsignedFault)));
        assert!(tally.is_empty());
    }

    #[test]
    fn different_heights_are_separate_tuples() {
        let mut tally = FaultTally::new();
        tally.record(&fault(1, 50)).unwrap();
        tally.record(&fault(1, 51)).unwrap();
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn signature_list_independent_of_arrival_order() {
        let leader = keypair_from_seed(&[99; 32]);
        let ts = Timestamp::from_millis(5_000);

        let mut forward = FaultTally::new();
        for seed in [1, 2, 3] {
            forward.record(&fault(seed, 50)).unwrap();
        }
        let mut reverse = FaultTally::new();
        for seed in [3, 2, 1] {
            reverse.record(&fault(seed, 50)).unwrap();
        }

        let key = fault(1, 50).key();
        let a = forward.build_full_fault(&key, ts, &leader).unwrap().unwrap();
        let b = reverse.build_full_fault(&key, ts, &leader).unwrap().unwrap();
        assert_eq!(a.signature_list(), b.signature_list());
        assert_eq!(a, b);

        let keys: Vec<_> = a.signature_list().iter().map(|s| s.public_key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn built_fault_is_signed_and_matches_tuple() {
        let leader = keypair_from_seed(&[99; 32]);
        let mut tally = FaultTally::new();
        let f = fault(1, 50);
        tally.record(&f).unwrap();

        let full = tally
            .build_full_fault(&f.key(), Timestamp::from_millis(9), &leader)
            .unwrap()
            .unwrap();
        assert_eq!(full.key(), f.key());
        let sig = full.signature().unwrap();
        assert_eq!(sig.public_key, leader.public);
        assert!(verify_full(&full.marshal_for_signature().unwrap(), sig));
    }

    #[test]
    fn build_for_unknown_key_is_none() {
        let tally = FaultTally::new();
        let leader = keypair_from_seed(&[99; 32]);
        let key = fault(1, 50).key();
        assert!(tally.build_full_fault(&key, Timestamp::from_millis(1), &leader).unwrap().is_none());
    }

    #[test]
    fn prune_below_drops_old_heights() {
        let mut tally = FaultTally::new();
        tally.record(&fault(1, 10)).unwrap();
        tally.record(&fault(1, 20)).unwrap();
        tally.record(&fault(1, 30)).unwrap();
        assert_eq!(tally.prune_below(20), 1);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.signature_count(&fault(1, 10).key()), 0);
    }

    #[test]
    fn remove_returns_signatures() {
        let mut tally = FaultTally::new();
        tally.record(&fault(1, 10)).unwrap();
        tally.record(&fault(2, 10)).unwrap();
        let sigs = tally.remove(&fault(1, 10).key());
        assert_eq!(sigs.len(), 2);
        assert!(tally.is_empty());
    }
}
