//! Tag-dispatched decoding and the message enum handed to downstream code.

use fedchain_protocol::{Decode, DecodeError, EncodeError};
use fedchain_types::{FullSignature, Hash, Timestamp};
use serde::Serialize;

use crate::{
    FullServerFault, JsonExport, MessageError, MessageType, NodeState, ServerFault, Signable,
    ValidationResult,
};

/// Behaviour common to every protocol message.
pub trait ProtocolMessage {
    fn message_type(&self) -> MessageType;
    fn timestamp(&self) -> Timestamp;
    fn msg_hash(&self) -> Option<Hash>;
    /// Directory-block height the message is scoped to.
    fn db_height(&self) -> u32;
    fn verify_signature(&self) -> Result<bool, MessageError>;
    fn validate(&self, state: &dyn NodeState) -> ValidationResult;
    /// Validation that skips the local signature check. Only for values
    /// whose `verify_signature` already returned `Ok(true)`.
    fn validate_prechecked(&self, state: &dyn NodeState) -> ValidationResult;
    fn leader_execute(&self, state: &dyn NodeState);
    fn follower_execute(&self, state: &dyn NodeState);
}

macro_rules! impl_protocol_message {
    ($ty:ty) => {
        impl ProtocolMessage for $ty {
            fn message_type(&self) -> MessageType {
                <$ty>::TYPE
            }
            fn timestamp(&self) -> Timestamp {
                <$ty>::timestamp(self)
            }
            fn msg_hash(&self) -> Option<Hash> {
                <$ty>::msg_hash(self)
            }
            fn db_height(&self) -> u32 {
                <$ty>::db_height(self)
            }
            fn verify_signature(&self) -> Result<bool, MessageError> {
                <$ty>::verify_signature(self)
            }
            fn validate(&self, state: &dyn NodeState) -> ValidationResult {
                <$ty>::validate(self, state)
            }
            fn validate_prechecked(&self, state: &dyn NodeState) -> ValidationResult {
                <$ty>::validate_prechecked(self, state)
            }
            fn leader_execute(&self, state: &dyn NodeState) {
                <$ty>::leader_execute(self, state)
            }
            fn follower_execute(&self, state: &dyn NodeState) {
                <$ty>::follower_execute(self, state)
            }
        }
    };
}

impl_protocol_message!(ServerFault);
impl_protocol_message!(FullServerFault);

/// A decoded message of any known type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Message {
    ServerFault(ServerFault),
    FullServerFault(FullServerFault),
}

/// Decode a complete message, dispatching on its leading type tag.
pub fn decode_message(data: &[u8]) -> Result<Message, DecodeError> {
    let tag = *data.first().ok_or(DecodeError::Empty)?;
    match MessageType::try_from(tag)? {
        MessageType::ServerFault => Ok(Message::ServerFault(ServerFault::decode_exact(data)?)),
        MessageType::FullServerFault => {
            Ok(Message::FullServerFault(FullServerFault::decode_exact(data)?))
        }
    }
}

impl Message {
    fn inner(&self) -> &dyn ProtocolMessage {
        match self {
            Self::ServerFault(m) => m,
            Self::FullServerFault(m) => m,
        }
    }

    pub fn marshal_binary(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::ServerFault(m) => m.marshal_binary(),
            Self::FullServerFault(m) => m.marshal_binary(),
        }
    }

    pub fn signature(&self) -> Option<&FullSignature> {
        match self {
            Self::ServerFault(m) => m.signature(),
            Self::FullServerFault(m) => m.signature(),
        }
    }

    /// Equal when both are the same variant and structurally equal.
    pub fn is_same_as(&self, other: &Message) -> bool {
        self == other
    }
}

impl ProtocolMessage for Message {
    fn message_type(&self) -> MessageType {
        self.inner().message_type()
    }

    fn timestamp(&self) -> Timestamp {
        self.inner().timestamp()
    }

    fn msg_hash(&self) -> Option<Hash> {
        self.inner().msg_hash()
    }

    fn db_height(&self) -> u32 {
        self.inner().db_height()
    }

    fn verify_signature(&self) -> Result<bool, MessageError> {
        self.inner().verify_signature()
    }

    fn validate(&self, state: &dyn NodeState) -> ValidationResult {
        self.inner().validate(state)
    }

    fn validate_prechecked(&self, state: &dyn NodeState) -> ValidationResult {
        self.inner().validate_prechecked(state)
    }

    fn leader_execute(&self, state: &dyn NodeState) {
        self.inner().leader_execute(state)
    }

    fn follower_execute(&self, state: &dyn NodeState) {
        self.inner().follower_execute(state)
    }
}

impl JsonExport for Message {}

impl From<ServerFault> for Message {
    fn from(m: ServerFault) -> Self {
        Self::ServerFault(m)
    }
}

impl From<FullServerFault> for Message {
    fn from(m: FullServerFault) -> Self {
        Self::FullServerFault(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestState;
    use fedchain_crypto::keypair_from_seed;

    fn fault() -> ServerFault {
        ServerFault::new(Timestamp::from_millis(10), Hash::new([1; 32]), 0, 5, 6)
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode_message(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn unknown_tag() {
        let mut bytes = fault().marshal_binary().unwrap();
        bytes[0] = 0x7f;
        assert_eq!(decode_message(&bytes), Err(DecodeError::UnknownMessageType(0x7f)));
    }

    #[test]
    fn dispatches_by_tag() {
        let kp = keypair_from_seed(&[4; 32]);
        let sf = fault().sign(&kp).unwrap();
        let full = FullServerFault::from_body(*sf.body()).sign(&kp).unwrap();

        let m1 = decode_message(&sf.marshal_binary().unwrap()).unwrap();
        let m2 = decode_message(&full.marshal_binary().unwrap()).unwrap();
        assert_eq!(m1.message_type(), MessageType::ServerFault);
        assert_eq!(m2.message_type(), MessageType::FullServerFault);
        assert_eq!(m1, Message::from(sf));
        assert_eq!(m2, Message::from(full));
        assert!(!m1.is_same_as(&m2));
    }

    #[test]
    fn trailing_bytes_after_signature_are_rejected() {
        let kp = keypair_from_seed(&[4; 32]);
        let mut bytes = fault().sign(&kp).unwrap().marshal_binary().unwrap();
        bytes.push(0);
        assert_eq!(decode_message(&bytes), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn enum_forwards_to_variant() {
        let kp = keypair_from_seed(&[4; 32]);
        let msg = Message::from(fault().sign(&kp).unwrap());
        let state = TestState::authorizing(kp.public);
        assert_eq!(msg.db_height(), 5);
        assert_eq!(msg.timestamp(), Timestamp::from_millis(10));
        assert_eq!(msg.validate(&state), ValidationResult::Valid);
        assert!(msg.verify_signature().unwrap());
        msg.follower_execute(&state);
        assert_eq!(state.executed().len(), 1);
        assert_eq!(msg.msg_hash(), decode_message(&msg.marshal_binary().unwrap()).unwrap().msg_hash());
    }

    #[test]
    fn json_is_untagged() {
        let json = Message::from(fault()).to_json_string().unwrap();
        assert!(json.starts_with("{\"Timestamp\""), "{json}");
    }
}
