use fedchain_protocol::{DecodeError, EncodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("message is not signed")]
    Unsigned,

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}
