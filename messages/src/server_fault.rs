//! Single-signer accusation against a VM leader.

use std::fmt;
use std::sync::OnceLock;

use fedchain_crypto::sha256;
use fedchain_protocol::{Decode, DecodeError, Encode, EncodeError, Reader, Writer};
use fedchain_types::{FullSignature, Hash, KeyPair, Timestamp};
use serde::Serialize;

use crate::fault::{FaultBody, FaultKey, FAULT_PAYLOAD_LEN};
use crate::validation::{validate_prechecked, validate_signed};
use crate::{
    sign_signable, verify_signable, JsonExport, MessageError, MessageType, NodeState, Signable,
    ValidationResult,
};

/// One federated server's claim that the leader of `vm_index` has failed.
///
/// Values are immutable once hashed: signing consumes the message and returns
/// a new one, so the memoized hash always matches the marshaled bytes.
#[derive(Clone, Debug, Serialize)]
pub struct ServerFault {
    #[serde(flatten)]
    body: FaultBody,
    #[serde(rename = "Signature", skip_serializing_if = "Option::is_none")]
    signature: Option<FullSignature>,
    #[serde(skip)]
    hash: OnceLock<Hash>,
}

impl ServerFault {
    pub const TYPE: MessageType = MessageType::ServerFault;

    pub fn new(timestamp: Timestamp, server_id: Hash, vm_index: u8, db_height: u32, height: u32) -> Self {
        Self::from_body(FaultBody::new(timestamp, server_id, vm_index, db_height, height))
    }

    pub fn from_body(body: FaultBody) -> Self {
        Self {
            body,
            signature: None,
            hash: OnceLock::new(),
        }
    }

    pub fn body(&self) -> &FaultBody {
        &self.body
    }

    pub fn key(&self) -> FaultKey {
        self.body.key()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.body.timestamp
    }

    pub fn server_id(&self) -> Hash {
        self.body.server_id
    }

    pub fn vm_index(&self) -> u8 {
        self.body.vm_index
    }

    pub fn db_height(&self) -> u32 {
        self.body.db_height
    }

    pub fn height(&self) -> u32 {
        self.body.height
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Sign the payload and return the signed message.
    pub fn sign(self, keypair: &KeyPair) -> Result<Self, MessageError> {
        let signature = sign_signable(&self, keypair)?;
        Ok(self.with_signature(signature))
    }

    /// Attach an externally produced signature.
    pub fn with_signature(self, signature: FullSignature) -> Self {
        Self {
            body: self.body,
            signature: Some(signature),
            hash: OnceLock::new(),
        }
    }

    /// SHA-256 of the full marshaled form, computed once.
    ///
    /// `None` only when the message cannot be marshaled.
    pub fn msg_hash(&self) -> Option<Hash> {
        if let Some(hash) = self.hash.get() {
            return Some(*hash);
        }
        let bytes = self.marshal_binary().ok()?;
        Some(*self.hash.get_or_init(|| sha256(&bytes)))
    }

    /// Decode from the front of `data`, returning the unconsumed tail.
    pub fn unmarshal_binary_data(data: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        Self::decode_prefix(data)
    }

    pub fn unmarshal_binary(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_exact(data)
    }

    /// Cryptographic check of the attached signature, without node state.
    pub fn verify_signature(&self) -> Result<bool, MessageError> {
        verify_signable(self)
    }

    pub fn validate(&self, state: &dyn NodeState) -> ValidationResult {
        validate_signed("server_fault", self, self.body.db_height, state)
    }

    /// [`validate`](Self::validate) for a value whose
    /// [`verify_signature`](Self::verify_signature) already returned `Ok(true)`.
    pub fn validate_prechecked(&self, state: &dyn NodeState) -> ValidationResult {
        validate_prechecked("server_fault", self, self.body.db_height, state)
    }

    pub fn leader_execute(&self, state: &dyn NodeState) {
        self.follower_execute(state);
    }

    pub fn follower_execute(&self, state: &dyn NodeState) {
        state.follower_execute_server_fault(self);
    }

    /// Structural equality: body and signature.
    pub fn is_same_as(&self, other: &ServerFault) -> bool {
        self == other
    }
}

impl PartialEq for ServerFault {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body && self.signature == other.signature
    }
}

impl Eq for ServerFault {}

impl Signable for ServerFault {
    fn marshal_for_signature(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::with_capacity(FAULT_PAYLOAD_LEN);
        self.body.encode_payload(Self::TYPE.as_u8(), &mut writer)?;
        Ok(writer.into_bytes())
    }

    fn signature(&self) -> Option<&FullSignature> {
        self.signature.as_ref()
    }
}

impl Encode for ServerFault {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.body.encode_payload(Self::TYPE.as_u8(), writer)?;
        if let Some(sig) = &self.signature {
            writer.write(sig)?;
        }
        Ok(())
    }
}

impl Decode for ServerFault {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let body = FaultBody::decode_payload(Self::TYPE.as_u8(), reader)?;
        let signature = if reader.is_empty() {
            None
        } else {
            Some(reader.read()?)
        };
        Ok(Self {
            body,
            signature,
            hash: OnceLock::new(),
        })
    }
}

impl JsonExport for ServerFault {}

pub(crate) fn short_hash(hash: Option<Hash>) -> String {
    match hash {
        Some(h) => hex::encode(&h.as_bytes()[..3]),
        None => "------".to_string(),
    }
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6}-VM{:>3}: PL:{:>5} DBHt:{:>5} -- hash[:3]={}",
            "SFault",
            self.body.vm_index,
            self.body.height,
            self.body.db_height,
            short_hash(self.msg_hash()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestState;
    use fedchain_crypto::keypair_from_seed;

    fn unsigned() -> ServerFault {
        ServerFault::new(Timestamp::from_millis(1_700_000_000_000), Hash::new([0xab; 32]), 3, 100, 7)
    }

    #[test]
    fn signed_roundtrip_preserves_fields() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        let bytes = fault.marshal_binary().unwrap();
        assert_eq!(bytes.len(), FAULT_PAYLOAD_LEN + FullSignature::LEN);

        let decoded = ServerFault::unmarshal_binary(&bytes).unwrap();
        assert_eq!(decoded.db_height(), 100);
        assert_eq!(decoded.height(), 7);
        assert_eq!(decoded.vm_index(), 3);
        assert_eq!(decoded.server_id(), Hash::new([0xab; 32]));
        assert_eq!(decoded.timestamp(), fault.timestamp());
        assert_eq!(decoded.signature(), fault.signature());
        assert_eq!(decoded, fault);
    }

    #[test]
    fn unsigned_roundtrip_has_no_signature() {
        let bytes = unsigned().marshal_binary().unwrap();
        assert_eq!(bytes.len(), FAULT_PAYLOAD_LEN);
        let decoded = ServerFault::unmarshal_binary(&bytes).unwrap();
        assert!(!decoded.is_signed());
        assert_eq!(decoded, unsigned());
    }

    #[test]
    fn payload_excludes_signature() {
        let kp = keypair_from_seed(&[1; 32]);
        let plain = unsigned();
        let signed = unsigned().sign(&kp).unwrap();
        assert_eq!(
            plain.marshal_for_signature().unwrap(),
            signed.marshal_for_signature().unwrap()
        );
    }

    #[test]
    fn decode_rejects_full_fault_tag() {
        let mut bytes = unsigned().marshal_binary().unwrap();
        bytes[0] = MessageType::FullServerFault.as_u8();
        assert_eq!(
            ServerFault::unmarshal_binary(&bytes),
            Err(DecodeError::InvalidMessageType { expected: 2, found: 4 })
        );
    }

    #[test]
    fn partial_signature_is_truncation() {
        let kp = keypair_from_seed(&[1; 32]);
        let bytes = unsigned().sign(&kp).unwrap().marshal_binary().unwrap();
        let err = ServerFault::unmarshal_binary(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { field: "signature", .. }));
    }

    #[test]
    fn unmarshal_binary_data_returns_tail() {
        // Unsigned messages read any tail as a signature, so sign first.
        let kp = keypair_from_seed(&[1; 32]);
        let mut bytes = unsigned().sign(&kp).unwrap().marshal_binary().unwrap();
        bytes.extend_from_slice(&[0xee, 0xff]);
        let (_, rest) = ServerFault::unmarshal_binary_data(&bytes).unwrap();
        assert_eq!(rest, &[0xee, 0xff]);
    }

    #[test]
    fn hash_is_memoized_and_covers_signature() {
        let kp = keypair_from_seed(&[1; 32]);
        let plain = unsigned();
        let h1 = plain.msg_hash().unwrap();
        assert_eq!(plain.msg_hash(), Some(h1));
        assert_eq!(h1, sha256(&plain.marshal_binary().unwrap()));

        let signed = plain.sign(&kp).unwrap();
        assert_ne!(signed.msg_hash(), Some(h1));
    }

    #[test]
    fn different_signers_give_different_hashes() {
        let a = unsigned().sign(&keypair_from_seed(&[1; 32])).unwrap();
        let b = unsigned().sign(&keypair_from_seed(&[2; 32])).unwrap();
        assert_ne!(a.msg_hash(), b.msg_hash());
        assert!(!a.is_same_as(&b));
    }

    #[test]
    fn validate_valid_for_authorized_signer() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        let state = TestState::authorizing(kp.public);
        assert_eq!(fault.validate(&state), ValidationResult::Valid);
        assert!(fault.verify_signature().unwrap());
    }

    #[test]
    fn validate_invalid_for_unknown_signer() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        let state = TestState::default();
        assert_eq!(fault.validate(&state), ValidationResult::Invalid);
    }

    #[test]
    fn validate_invalid_when_lookup_errors() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        let mut state = TestState::authorizing(kp.public);
        state.fail_lookup = true;
        assert_eq!(fault.validate(&state), ValidationResult::Invalid);
    }

    #[test]
    fn validate_pending_when_signer_set_unknown() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        let mut state = TestState::authorizing(kp.public);
        state.unknown_heights.insert(100);
        assert_eq!(fault.validate(&state), ValidationResult::Pending);
    }

    #[test]
    fn validate_invalid_when_unsigned() {
        let state = TestState::default();
        assert_eq!(unsigned().validate(&state), ValidationResult::Invalid);
        assert!(matches!(unsigned().verify_signature(), Err(MessageError::Unsigned)));
    }

    #[test]
    fn validate_invalid_when_timestamp_unmarshalable() {
        let kp = keypair_from_seed(&[1; 32]);
        let signed = unsigned().sign(&kp).unwrap();
        let sig = *signed.signature().unwrap();
        let huge = ServerFault::new(Timestamp::from_millis(1 << 50), Hash::ZERO, 0, 1, 1)
            .with_signature(sig);
        let state = TestState::authorizing(kp.public);
        assert_eq!(huge.validate(&state), ValidationResult::Invalid);
        assert_eq!(huge.msg_hash(), None);
    }

    #[test]
    fn tampered_height_is_invalid_even_if_pending() {
        let kp = keypair_from_seed(&[1; 32]);
        let mut bytes = unsigned().sign(&kp).unwrap().marshal_binary().unwrap();
        bytes[41] ^= 0x01;
        let tampered = ServerFault::unmarshal_binary(&bytes).unwrap();
        let mut state = TestState::authorizing(kp.public);
        state.unknown_heights.insert(tampered.db_height());
        assert_eq!(tampered.validate(&state), ValidationResult::Invalid);
    }

    #[test]
    fn prechecked_validation_still_consults_state() {
        let kp = keypair_from_seed(&[1; 32]);
        let fault = unsigned().sign(&kp).unwrap();
        assert!(fault.verify_signature().unwrap());

        let state = TestState::authorizing(kp.public);
        assert_eq!(fault.validate_prechecked(&state), ValidationResult::Valid);
        assert_eq!(fault.validate_prechecked(&TestState::default()), ValidationResult::Invalid);

        let mut pending = TestState::authorizing(kp.public);
        pending.unknown_heights.insert(100);
        assert_eq!(fault.validate_prechecked(&pending), ValidationResult::Pending);

        assert_eq!(unsigned().validate_prechecked(&state), ValidationResult::Invalid);
    }

    #[test]
    fn leader_and_follower_execute_forward_to_state() {
        let fault = unsigned();
        let state = TestState::default();
        fault.leader_execute(&state);
        fault.follower_execute(&state);
        assert_eq!(
            state.executed(),
            vec![("server_fault", fault.server_id()), ("server_fault", fault.server_id())]
        );
    }

    #[test]
    fn is_same_as_compares_body() {
        let a = unsigned();
        let b = ServerFault::new(a.timestamp(), a.server_id(), a.vm_index(), a.db_height(), 8);
        assert!(a.is_same_as(&unsigned()));
        assert!(!a.is_same_as(&b));
    }

    #[test]
    fn json_uses_exported_field_names() {
        let json = unsigned().to_json_string().unwrap();
        for field in ["\"Timestamp\"", "\"ServerID\"", "\"VMIndex\"", "\"DBHeight\"", "\"Height\""] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
        assert!(!json.contains("\"Signature\""));
        assert!(json.contains(&"ab".repeat(32)));
    }

    #[test]
    fn display_matches_debug_line() {
        let s = unsigned().to_string();
        assert!(s.starts_with("SFault-VM  3: PL:    7 DBHt:  100 -- hash[:3]="), "{s}");
    }
}
