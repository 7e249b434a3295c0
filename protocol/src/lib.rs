//! Binary codec for the fedchain wire protocol.
//!
//! Every on-wire field has exactly one canonical layout: big-endian integers,
//! no padding, fixed-width hashes and signatures. Decoding consumes a prefix of
//! the input and leaves the remainder in the [`Reader`], so composite messages
//! decode field by field without length prefixes. Reading past the end of the
//! buffer is always a [`DecodeError`], never a panic.

pub mod codec;
pub mod error;

pub use codec::{Decode, Encode, Reader, Writer, MAX_VAR_BYTES, TIMESTAMP_LEN};
pub use error::{DecodeError, EncodeError};
