//! Field-level encoding primitives.
//!
//! [`Writer`] appends canonical field encodings to a byte buffer; [`Reader`]
//! consumes them from the front of a slice. Both are deliberately dumb: message
//! types compose them in a fixed field order and that order *is* the format.

use fedchain_types::{FullSignature, Hash, PublicKey, Signature, Timestamp};

use crate::{DecodeError, EncodeError};

/// Width of the timestamp field: 48-bit big-endian milliseconds.
pub const TIMESTAMP_LEN: usize = 6;

/// Upper bound on a length-prefixed byte string.
///
/// Checked before allocating so a forged length prefix cannot exhaust memory.
pub const MAX_VAR_BYTES: usize = 1 << 20;

/// A value with a canonical binary form.
pub trait Encode {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::new();
        self.encode(&mut writer)?;
        Ok(writer.into_bytes())
    }
}

/// A value that can be read back from its canonical binary form.
pub trait Decode: Sized {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError>;

    /// Decode a value from the front of `data`, returning it together with
    /// the unconsumed remainder.
    fn decode_prefix(data: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let mut reader = Reader::new(data);
        let value = Self::decode(&mut reader)?;
        Ok((value, reader.rest()))
    }

    /// Decode a value that must span all of `data`.
    fn decode_exact(data: &[u8]) -> Result<Self, DecodeError> {
        let (value, rest) = Self::decode_prefix(data)?;
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes(rest.len()));
        }
        Ok(value)
    }
}

/// Append-only byte sink.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a `u32` length followed by the bytes themselves.
    pub fn write_var_bytes(&mut self, field: &'static str, bytes: &[u8]) -> Result<(), EncodeError> {
        if bytes.len() > MAX_VAR_BYTES {
            return Err(EncodeError::LengthOverflow {
                field,
                len: bytes.len(),
                max: MAX_VAR_BYTES,
            });
        }
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
        Ok(())
    }

    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.encode(self)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked cursor over an input slice.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes not yet consumed.
    pub fn rest(&self) -> &'a [u8] {
        self.data
    }

    /// Consume exactly `n` bytes, or fail naming `field`.
    pub fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.data.len() < n {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining: self.data.len(),
            });
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.first().copied()
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(field, 1)?[0])
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.read_array(field)?))
    }

    /// Read a `u32`-length-prefixed byte string.
    pub fn read_var_bytes(&mut self, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32(field)? as usize;
        if len > MAX_VAR_BYTES {
            return Err(DecodeError::LengthOverflow {
                field,
                len,
                max: MAX_VAR_BYTES,
            });
        }
        Ok(self.take(field, len)?.to_vec())
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, DecodeError> {
        T::decode(self)
    }
}

// ── Primitive impls ─────────────────────────────────────────────────────

impl Encode for Hash {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.write_bytes(self.as_bytes());
        Ok(())
    }
}

impl Decode for Hash {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Hash::new(reader.read_array("hash")?))
    }
}

impl Encode for Timestamp {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        if !self.fits_wire() {
            return Err(EncodeError::TimestampOutOfRange(self.as_millis()));
        }
        let bytes = self.as_millis().to_be_bytes();
        writer.write_bytes(&bytes[8 - TIMESTAMP_LEN..]);
        Ok(())
    }
}

impl Decode for Timestamp {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let raw: [u8; TIMESTAMP_LEN] = reader.read_array("timestamp")?;
        let mut bytes = [0u8; 8];
        bytes[8 - TIMESTAMP_LEN..].copy_from_slice(&raw);
        Ok(Timestamp::from_millis(u64::from_be_bytes(bytes)))
    }
}

impl Encode for PublicKey {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.write_bytes(self.as_bytes());
        Ok(())
    }
}

impl Decode for PublicKey {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(PublicKey(reader.read_array("public_key")?))
    }
}

impl Encode for FullSignature {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.write_bytes(self.public_key.as_bytes());
        writer.write_bytes(self.signature.as_bytes());
        Ok(())
    }
}

impl Decode for FullSignature {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        // Check the whole width up front so a short tail reports one stage.
        if reader.remaining() < FullSignature::LEN {
            return Err(DecodeError::Truncated {
                field: "signature",
                needed: FullSignature::LEN,
                remaining: reader.remaining(),
            });
        }
        let public_key = PublicKey(reader.read_array("signature")?);
        let signature = Signature(reader.read_array("signature")?);
        Ok(FullSignature::new(public_key, signature))
    }
}
