//! The body shared by both fault message variants.
//!
//! Signable payload layout (big-endian):
//!
//! ```text
//! byte  type_tag
//! 6B    timestamp (millis)
//! 32B   server_id
//! 1B    vm_index
//! 4B    db_height
//! 4B    height
//! ```

use fedchain_protocol::{DecodeError, EncodeError, Reader, Writer, TIMESTAMP_LEN};
use fedchain_types::{Hash, Timestamp};
use serde::Serialize;

/// Length of the signable payload, tag included.
pub const FAULT_PAYLOAD_LEN: usize = 1 + TIMESTAMP_LEN + Hash::LEN + 1 + 4 + 4;

/// An accusation that the leader of a VM lane should be replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FaultBody {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    /// Identity of the accused leader.
    #[serde(rename = "ServerID")]
    pub server_id: Hash,
    #[serde(rename = "VMIndex")]
    pub vm_index: u8,
    #[serde(rename = "DBHeight")]
    pub db_height: u32,
    #[serde(rename = "Height")]
    pub height: u32,
}

/// The tuple that identifies "the same" fault across signers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultKey {
    pub server_id: Hash,
    pub vm_index: u8,
    pub db_height: u32,
    pub height: u32,
}

impl FaultBody {
    pub fn new(timestamp: Timestamp, server_id: Hash, vm_index: u8, db_height: u32, height: u32) -> Self {
        Self {
            timestamp,
            server_id,
            vm_index,
            db_height,
            height,
        }
    }

    pub fn key(&self) -> FaultKey {
        FaultKey {
            server_id: self.server_id,
            vm_index: self.vm_index,
            db_height: self.db_height,
            height: self.height,
        }
    }

    /// Write the signable payload under the given type tag.
    pub(crate) fn encode_payload(&self, tag: u8, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.write_u8(tag);
        writer.write(&self.timestamp)?;
        writer.write(&self.server_id)?;
        writer.write_u8(self.vm_index);
        writer.write_u32(self.db_height);
        writer.write_u32(self.height);
        Ok(())
    }

    /// Read the signable payload, rejecting any tag other than `expected`.
    pub(crate) fn decode_payload(expected: u8, reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let found = reader.read_u8("type")?;
        if found != expected {
            return Err(DecodeError::InvalidMessageType { expected, found });
        }
        let timestamp = reader.read()?;
        let server_id = Hash::new(reader.read_array("server_id")?);
        let vm_index = reader.read_u8("vm_index")?;
        let db_height = reader.read_u32("db_height")?;
        let height = reader.read_u32("height")?;
        Ok(Self {
            timestamp,
            server_id,
            vm_index,
            db_height,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> FaultBody {
        FaultBody::new(Timestamp::from_millis(1_000), Hash::new([3; 32]), 3, 100, 7)
    }

    #[test]
    fn payload_layout() {
        let mut w = Writer::new();
        body().encode_payload(2, &mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), FAULT_PAYLOAD_LEN);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..7], &[0, 0, 0, 0, 0x03, 0xe8]);
        assert_eq!(&bytes[7..39], &[3u8; 32]);
        assert_eq!(bytes[39], 3);
        assert_eq!(&bytes[40..44], &100u32.to_be_bytes());
        assert_eq!(&bytes[44..48], &7u32.to_be_bytes());
    }

    #[test]
    fn decode_rejects_wrong_tag() {
        let mut w = Writer::new();
        body().encode_payload(2, &mut w).unwrap();
        let bytes = w.into_bytes();
        let err = FaultBody::decode_payload(4, &mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, DecodeError::InvalidMessageType { expected: 4, found: 2 });
    }

    #[test]
    fn each_stage_reports_truncation() {
        let mut w = Writer::new();
        body().encode_payload(2, &mut w).unwrap();
        let bytes = w.into_bytes();
        let cases = [
            (0, "type"),
            (3, "timestamp"),
            (10, "server_id"),
            (39, "vm_index"),
            (42, "db_height"),
            (46, "height"),
        ];
        for (len, stage) in cases {
            match FaultBody::decode_payload(2, &mut Reader::new(&bytes[..len])) {
                Err(DecodeError::Truncated { field, .. }) => assert_eq!(field, stage),
                other => panic!("prefix {len}: expected truncation at {stage}, got {other:?}"),
            }
        }
    }

    #[test]
    fn key_ignores_timestamp() {
        let a = body();
        let mut b = body();
        b.timestamp = Timestamp::from_millis(9_999);
        assert_eq!(a.key(), b.key());
    }
}
