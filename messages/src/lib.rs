//! Signed protocol messages exchanged between federated servers.
//!
//! Every message starts with a one-byte [`MessageType`] tag. Signable messages
//! define a *signable payload* (tag + body, never the signature itself) and
//! marshal as `payload ++ signature`. Decoding goes through [`decode_message`],
//! which returns the [`Message`] enum; downstream code matches on the variant.
//!
//! Validation is tri-state ([`ValidationResult`]) and consults live consensus
//! state only through the narrow [`NodeState`] capability trait.

pub mod error;
pub mod fault;
pub mod full_server_fault;
pub mod json;
pub mod message;
pub mod message_type;
pub mod server_fault;
pub mod signable;
pub mod state;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::MessageError;
pub use fault::{FaultBody, FaultKey};
pub use full_server_fault::FullServerFault;
pub use json::JsonExport;
pub use message::{decode_message, Message, ProtocolMessage};
pub use message_type::MessageType;
pub use server_fault::ServerFault;
pub use signable::{sign_signable, verify_signable, Signable};
pub use state::{NodeState, StateError};
pub use validation::ValidationResult;
