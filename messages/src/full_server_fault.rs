//! Aggregate fault built from matching single-signer accusations.

use std::fmt;
use std::sync::OnceLock;

use fedchain_crypto::sha256;
use fedchain_protocol::{Decode, DecodeError, Encode, EncodeError, Reader, Writer};
use fedchain_types::{FullSignature, Hash, KeyPair, Timestamp};
use serde::Serialize;

use crate::fault::{FaultBody, FaultKey, FAULT_PAYLOAD_LEN};
use crate::server_fault::short_hash;
use crate::validation::{validate_prechecked, validate_signed};
use crate::{
    sign_signable, verify_signable, JsonExport, MessageError, MessageType, NodeState, Signable,
    ValidationResult,
};

/// A fault carrying the collected accusation signatures for one
/// `(server_id, vm_index, db_height, height)` tuple.
///
/// `signature_list` is local bookkeeping. It is not part of the signable
/// payload and not part of the marshaled form; only the primary `signature`
/// travels on the wire.
#[derive(Clone, Debug, Serialize)]
pub struct FullServerFault {
    #[serde(flatten)]
    body: FaultBody,
    #[serde(rename = "SignatureList")]
    signature_list: Vec<FullSignature>,
    #[serde(rename = "Signature", skip_serializing_if = "Option::is_none")]
    signature: Option<FullSignature>,
    #[serde(skip)]
    hash: OnceLock<Hash>,
}

impl FullServerFault {
    pub const TYPE: MessageType = MessageType::FullServerFault;

    pub fn new(timestamp: Timestamp, server_id: Hash, vm_index: u8, db_height: u32, height: u32) -> Self {
        Self::from_body(FaultBody::new(timestamp, server_id, vm_index, db_height, height))
    }

    pub fn from_body(body: FaultBody) -> Self {
        Self {
            body,
            signature_list: Vec::new(),
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

    pub fn signature_list(&self) -> &[FullSignature] {
        &self.signature_list
    }

    /// Record a collected signature. Returns `false` if a signature from the
    /// same key is already present.
    ///
    /// The list does not feed the marshaled form, so the memoized hash stays
    /// valid.
    pub fn add_signature(&mut self, signature: FullSignature) -> bool {
        if self
            .signature_list
            .iter()
            .any(|s| s.public_key == signature.public_key)
        {
            return false;
        }
        self.signature_list.push(signature);
        true
    }

    pub fn with_signature_list(mut self, signatures: impl IntoIterator<Item = FullSignature>) -> Self {
        for sig in signatures {
            self.add_signature(sig);
        }
        self
    }

    pub fn sign(self, keypair: &KeyPair) -> Result<Self, MessageError> {
        let signature = sign_signable(&self, keypair)?;
        Ok(self.with_signature(signature))
    }

    pub fn with_signature(self, signature: FullSignature) -> Self {
        Self {
            body: self.body,
            signature_list: self.signature_list,
            signature: Some(signature),
            hash: OnceLock::new(),
        }
    }

    /// SHA-256 of the full marshaled form, computed once.
    pub fn msg_hash(&self) -> Option<Hash> {
        if let Some(hash) = self.hash.get() {
            return Some(*hash);
        }
        let bytes = self.marshal_binary().ok()?;
        Some(*self.hash.get_or_init(|| sha256(&bytes)))
    }

    pub fn unmarshal_binary_data(data: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        Self::decode_prefix(data)
    }

    pub fn unmarshal_binary(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_exact(data)
    }

    pub fn verify_signature(&self) -> Result<bool, MessageError> {
        verify_signable(self)
    }

    pub fn validate(&self, state: &dyn NodeState) -> ValidationResult {
        validate_signed("full_server_fault", self, self.body.db_height, state)
    }

    /// [`validate`](Self::validate) for a value whose
    /// [`verify_signature`](Self::verify_signature) already returned `Ok(true)`.
    pub fn validate_prechecked(&self, state: &dyn NodeState) -> ValidationResult {
        validate_prechecked("full_server_fault", self, self.body.db_height, state)
    }

    pub fn leader_execute(&self, state: &dyn NodeState) {
        self.follower_execute(state);
    }

    pub fn follower_execute(&self, state: &dyn NodeState) {
        state.follower_execute_full_fault(self);
    }

    /// Structural equality over body and primary signature.
    ///
    /// The signature list is excluded since it never crosses the wire.
    pub fn is_same_as(&self, other: &FullServerFault) -> bool {
        self == other
    }
}

impl PartialEq for FullServerFault {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body && self.signature == other.signature
    }
}

impl Eq for FullServerFault {}

impl Signable for FullServerFault {
    fn marshal_for_signature(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::with_capacity(FAULT_PAYLOAD_LEN);
        self.body.encode_payload(Self::TYPE.as_u8(), &mut writer)?;
        Ok(writer.into_bytes())
    }

    fn signature(&self) -> Option<&FullSignature> {
        self.signature.as_ref()
    }
}

impl Encode for FullServerFault {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.body.encode_payload(Self::TYPE.as_u8(), writer)?;
        if let Some(sig) = &self.signature {
            writer.write(sig)?;
        }
        Ok(())
    }
}

impl Decode for FullServerFault {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let body = FaultBody::decode_payload(Self::TYPE.as_u8(), reader)?;
        let signature = if reader.is_empty() {
            None
        } else {
            Some(reader.read()?)
        };
        Ok(Self {
            body,
            signature_list: Vec::new(),
            signature,
            hash: OnceLock::new(),
        })
    }
}

impl JsonExport for FullServerFault {}

impl fmt::Display for FullServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6}-VM{:>3}: PL:{:>5} DBHt:{:>5} -- hash[:3]={}\n SigList: [",
            "FullSFault",
            self.body.vm_index,
            self.body.height,
            self.body.db_height,
            short_hash(self.msg_hash()),
        )?;
        for (i, sig) in self.signature_list.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", hex::encode(&sig.public_key.as_bytes()[..4]))?;
        }
        f.write_str("]")
    }
}
