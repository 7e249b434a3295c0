use fedchain_protocol::{DecodeError, EncodeError};
use fedchain_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("block belongs to chain {found}, expected {expected}")]
    WrongChain { expected: Hash, found: Hash },

    #[error("body MR {stored} does not match transactions ({computed})")]
    BodyMismatch { stored: Hash, computed: Hash },
}
