use thiserror::Error;

/// Failure while turning bytes into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,

    #[error("truncated input decoding {field}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid message type: expected {expected}, found {found}")]
    InvalidMessageType { expected: u8, found: u8 },

    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    #[error("length {len} of {field} exceeds limit {max}")]
    LengthOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Failure while turning a typed value into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("timestamp {0}ms does not fit the 48-bit wire field")]
    TimestampOutOfRange(u64),

    #[error("length {len} of {field} exceeds limit {max}")]
    LengthOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
