//! One-byte message type tags.
//!
//! The numeric values are part of the wire format and must never be reused.

use fedchain_protocol::DecodeError;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MessageType {
    /// A single federated server accusing a leader.
    ServerFault = 2,
    /// An aggregate of matching accusations.
    FullServerFault = 4,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerFault => "server_fault",
            Self::FullServerFault => "full_server_fault",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            2 => Ok(Self::ServerFault),
            4 => Ok(Self::FullServerFault),
            other => Err(DecodeError::UnknownMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
