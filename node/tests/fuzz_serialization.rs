//! Property-based tests for the wire and storage boundaries.
//!
//! Anything that arrives off the network or out of storage must decode back
//! to exactly what was written, and malformed input must fail cleanly.

use proptest::prelude::*;

use fedchain_crypto::keypair_from_seed;
use fedchain_ledger::{FBlock, FBlockStore};
use fedchain_messages::fault::FAULT_PAYLOAD_LEN;
use fedchain_messages::{
    decode_message, FaultBody, FullServerFault, Message, ProtocolMessage, ServerFault, Signable,
    ValidationResult,
};
use fedchain_nullables::{NullState, NullStore};
use fedchain_protocol::DecodeError;
use fedchain_store::Overlay;
use fedchain_types::{Hash, Timestamp};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_hash() -> impl Strategy<Value = Hash> {
    any::<[u8; 32]>().prop_map(Hash::new)
}

fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..(1u64 << 48)).prop_map(Timestamp::from_millis)
}

fn arb_fault_body() -> impl Strategy<Value = FaultBody> {
    (arb_timestamp(), arb_hash(), any::<u8>(), any::<u32>(), any::<u32>()).prop_map(
        |(ts, server_id, vm, db_height, height)| {
            FaultBody::new(ts, server_id, vm, db_height, height)
        },
    )
}

/// Key seeds rather than key pairs: `KeyPair` has no `Debug`.
fn arb_seed() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

fn arb_transactions() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..6)
}

fn arb_fblock_chain() -> impl Strategy<Value = Vec<FBlock>> {
    (1usize..8, any::<u64>(), arb_transactions()).prop_map(|(len, rate, txs)| {
        let mut blocks = Vec::with_capacity(len);
        let mut prev = Hash::ZERO;
        let mut prev_ledger = Hash::ZERO;
        for h in 0..len as u32 {
            let b = FBlock::new(prev, prev_ledger, rate, h, txs.clone());
            prev = b.key_mr();
            prev_ledger = b.ledger_key_mr();
            blocks.push(b);
        }
        blocks
    })
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signed_server_fault_roundtrips(body in arb_fault_body(), seed in arb_seed()) {
        let kp = keypair_from_seed(&seed);
        let fault = ServerFault::from_body(body).sign(&kp).unwrap();
        let bytes = fault.marshal_binary().unwrap();
        let decoded = decode_message(&bytes).unwrap();
        prop_assert!(decoded.verify_signature().unwrap());
        prop_assert_eq!(decoded.msg_hash(), fault.msg_hash());
        prop_assert_eq!(decoded, Message::ServerFault(fault));
    }

    #[test]
    fn signed_full_fault_roundtrips(body in arb_fault_body(), seed in arb_seed()) {
        let kp = keypair_from_seed(&seed);
        let full = FullServerFault::from_body(body).sign(&kp).unwrap();
        let bytes = full.marshal_binary().unwrap();
        let decoded = decode_message(&bytes).unwrap();
        prop_assert!(decoded.verify_signature().unwrap());
        prop_assert_eq!(decoded, Message::FullServerFault(full));
    }

    #[test]
    fn fault_types_do_not_cross_decode(body in arb_fault_body()) {
        let sf = ServerFault::from_body(body).marshal_binary().unwrap();
        let full = FullServerFault::from_body(body).marshal_binary().unwrap();

        let is_type_mismatch =
            |r: Result<(), DecodeError>| matches!(r, Err(DecodeError::InvalidMessageType { .. }));
        prop_assert!(is_type_mismatch(FullServerFault::unmarshal_binary(&sf).map(|_| ())));
        prop_assert!(is_type_mismatch(ServerFault::unmarshal_binary(&full).map(|_| ())));
    }

    #[test]
    fn truncated_signed_fault_fails_cleanly(
        body in arb_fault_body(),
        seed in arb_seed(),
        cut in 0usize..144,
    ) {
        let kp = keypair_from_seed(&seed);
        let bytes = ServerFault::from_body(body).sign(&kp).unwrap().marshal_binary().unwrap();
        prop_assume!(cut < bytes.len());
        let result = decode_message(&bytes[..cut]);
        if cut == FAULT_PAYLOAD_LEN {
            // The payload alone is a complete unsigned message.
            let decoded = result.unwrap();
            prop_assert!(decoded.signature().is_none());
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn tampered_payload_validates_invalid(
        body in arb_fault_body(),
        seed in arb_seed(),
        index in 0usize..FAULT_PAYLOAD_LEN,
        flip in 1u8..=255,
    ) {
        let kp = keypair_from_seed(&seed);
        let mut bytes = ServerFault::from_body(body).sign(&kp).unwrap().marshal_binary().unwrap();
        bytes[index] ^= flip;

        // A flipped tag byte may no longer name a known message type.
        let Ok(decoded) = decode_message(&bytes) else {
            prop_assert_eq!(index, 0);
            return Ok(());
        };
        prop_assert!(!matches!(decoded.verify_signature(), Ok(true)));

        let state = NullState::with_signers([kp.public]);
        prop_assert_eq!(decoded.validate(&state), ValidationResult::Invalid);

        // Never deferred, even while the signer set is unknown.
        state.set_signer_set_known(decoded.db_height(), false);
        prop_assert_eq!(decoded.validate(&state), ValidationResult::Invalid);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_message(&data);
        let _ = FBlock::unmarshal_binary(&data);
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fblock_binary_roundtrips(chain in arb_fblock_chain()) {
        for b in &chain {
            let bytes = b.marshal_binary().unwrap();
            prop_assert_eq!(&FBlock::unmarshal_binary(&bytes).unwrap(), b);
        }
    }

    #[test]
    fn storing_twice_is_idempotent(chain in arb_fblock_chain()) {
        let overlay = Overlay::new(NullStore::new());
        for b in &chain {
            overlay.process_fblock_batch(b).unwrap();
        }
        let first_all = overlay.fetch_all_fblocks().unwrap();
        let records = overlay.store().record_count();

        for b in &chain {
            overlay.process_fblock_batch(b).unwrap();
        }
        prop_assert_eq!(overlay.fetch_all_fblocks().unwrap(), first_all);
        prop_assert_eq!(overlay.store().record_count(), records);
        let head = overlay.fetch_factoid_block_head().unwrap();
        prop_assert_eq!(head.as_ref(), chain.last());
    }

    #[test]
    fn fetch_all_returns_every_stored_block(chain in arb_fblock_chain()) {
        let overlay = Overlay::new(NullStore::new());
        for b in &chain {
            overlay.process_fblock_batch_without_head(b).unwrap();
        }
        prop_assert_eq!(overlay.fetch_factoid_block_head().unwrap(), None);

        let mut keys = overlay.fetch_all_fblock_keys().unwrap();
        keys.sort();
        let mut expected: Vec<Hash> = chain.iter().map(|b| b.key_mr()).collect();
        expected.sort();
        prop_assert_eq!(keys, expected);
        prop_assert_eq!(overlay.fetch_all_fblocks().unwrap().len(), chain.len());
    }
}
