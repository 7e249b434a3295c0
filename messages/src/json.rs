//! JSON inspection view of messages.
//!
//! Field names follow the exported struct field names (`Timestamp`,
//! `ServerID`, `VMIndex`, ...). This is a telemetry format, not a wire format,
//! and is never parsed back.

use serde::Serialize;
use std::io;

use crate::MessageError;

pub trait JsonExport: Serialize {
    fn to_json_bytes(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn to_json_string(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    fn write_json<W: io::Write>(&self, writer: W) -> Result<(), MessageError>
    where
        Self: Sized,
    {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}
