/*!
HTTP/3 frames seen on the receive control stream.

Every frame is a type, a length and a payload:

```text
HTTP/3 Frame {
  Type (i),
  Length (i),
  Frame Payload (..),
}
```

# decoder
[`HttpDecoder`] turns bytes into [`FrameEvent`]s and hands them to a [`DistributeFrameEvents`].

# encoder
The typed frames and the `encode_*` functions write sequential bytes to a `WriteByte`,
which is how a peer produces a control stream.
*/

mod decoder;

pub use decoder::*;

use crate::varint::{decode_varint, encode_varint, varint_len};
use crate::{ReadByte, WriteByte};
use getset::{CopyGetters, Getters, MutGetters};
use std::io::Error;

pub(crate) const DATA_FRAME_TYPE: u64 = 0x00;
pub(crate) const HEADERS_FRAME_TYPE: u64 = 0x01;
pub(crate) const CANCEL_PUSH_FRAME_TYPE: u64 = 0x03;
pub(crate) const SETTINGS_FRAME_TYPE: u64 = 0x04;
pub(crate) const PUSH_PROMISE_FRAME_TYPE: u64 = 0x05;
pub(crate) const GOAWAY_FRAME_TYPE: u64 = 0x07;
pub(crate) const MAX_PUSH_ID_FRAME_TYPE: u64 = 0x0d;
pub(crate) const DUPLICATE_PUSH_FRAME_TYPE: u64 = 0x0e;
pub(crate) const PRIORITY_UPDATE_FRAME_TYPE: u64 = 0x0f;

///SETTINGS_QPACK_MAX_TABLE_CAPACITY.
pub const SETTINGS_QPACK_MAX_TABLE_CAPACITY: u64 = 0x01;
///SETTINGS_MAX_HEADER_LIST_SIZE, also known as SETTINGS_MAX_FIELD_SECTION_SIZE.
pub const SETTINGS_MAX_HEADER_LIST_SIZE: u64 = 0x06;
///SETTINGS_QPACK_BLOCKED_STREAMS.
pub const SETTINGS_QPACK_BLOCKED_STREAMS: u64 = 0x07;

///Returns the name of a known setting identifier.
pub fn setting_name(id: u64) -> Option<&'static str> {
    match id {
        SETTINGS_QPACK_MAX_TABLE_CAPACITY => Some("SETTINGS_QPACK_MAX_TABLE_CAPACITY"),
        SETTINGS_MAX_HEADER_LIST_SIZE => Some("SETTINGS_MAX_HEADER_LIST_SIZE"),
        SETTINGS_QPACK_BLOCKED_STREAMS => Some("SETTINGS_QPACK_BLOCKED_STREAMS"),
        _ => None,
    }
}

#[inline(always)]
fn fill_header(frame_type: u64, length: usize, writer: &mut impl WriteByte) -> Option<Error> {
    encode_varint(frame_type, writer);
    encode_varint(length as u64, writer)
}

#[inline(always)]
fn encode_single_varint_frame(frame_type: u64, n: u64, writer: &mut impl WriteByte) -> Option<Error> {
    fill_header(frame_type, varint_len(n), writer);
    encode_varint(n, writer)
}

///Parses a payload that must hold exactly one varint.
fn parse_single_varint(payload: &[u8]) -> Result<u64, SingleVarintError> {
    let mut reader = payload;
    let n = decode_varint(&mut reader).ok_or(SingleVarintError::Unreadable)?;
    if reader.has_surplus() {
        Err(SingleVarintError::Superfluous)
    } else {
        Ok(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SingleVarintError {
    Unreadable,
    Superfluous,
}

///SETTINGS frame: identifier/value pairs kept in the order they were sent.
///
///Duplicate identifiers are kept; each pair is applied on its own.
#[derive(Clone, Default, PartialEq, Eq, Getters, MutGetters)]
pub struct SettingsFrame {
    #[getset(get = "pub", get_mut = "pub")]
    values: Vec<(u64, u64)>,
}

impl std::fmt::Debug for SettingsFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsFrame")
            .field("values", &self.values)
            .finish()
    }
}

impl std::fmt::Display for SettingsFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (id, value) in &self.values {
            match setting_name(*id) {
                Some(name) => write!(f, "{} = {}; ", name, value)?,
                None => write!(f, "{:#x} = {}; ", id, value)?,
            }
        }
        Ok(())
    }
}

impl SettingsFrame {
    ///Creates.
    pub fn new() -> Self {
        Self::default()
    }

    ///Creates with identifier/value pairs.
    pub fn with_values(values: Vec<(u64, u64)>) -> Self {
        Self { values }
    }

    ///Appends identifier and value to the back.
    pub fn push(&mut self, identifier: u64, value: u64) {
        self.values.push((identifier, value));
    }

    ///Returns the length of the encoded payload.
    pub fn payload_length(&self) -> usize {
        self.values
            .iter()
            .map(|(id, value)| varint_len(*id) + varint_len(*value))
            .sum()
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        fill_header(SETTINGS_FRAME_TYPE, self.payload_length(), writer);
        for (id, value) in &self.values {
            encode_varint(*id, writer);
            encode_varint(*value, writer);
        }
        None
    }

    pub(crate) fn parse(payload: &[u8]) -> Result<Self, &'static str> {
        let mut reader = payload;
        let mut values = Vec::new();
        while reader.has_surplus() {
            let id = decode_varint(&mut reader).ok_or("Unable to read setting identifier.")?;
            let value = decode_varint(&mut reader).ok_or("Unable to read setting value.")?;
            values.push((id, value));
        }
        Ok(Self { values })
    }
}

///MAX_PUSH_ID frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct MaxPushIdFrame {
    #[getset(get_copy = "pub")]
    push_id: u64,
}

impl MaxPushIdFrame {
    ///Creates.
    pub fn new(push_id: u64) -> Self {
        Self { push_id }
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        encode_single_varint_frame(MAX_PUSH_ID_FRAME_TYPE, self.push_id, writer)
    }
}

///GOAWAY frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct GoAwayFrame {
    ///The last stream the sender will process.
    #[getset(get_copy = "pub")]
    stream_id: u64,
}

impl GoAwayFrame {
    ///Creates.
    pub fn new(stream_id: u64) -> Self {
        Self { stream_id }
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        encode_single_varint_frame(GOAWAY_FRAME_TYPE, self.stream_id, writer)
    }
}

///CANCEL_PUSH frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct CancelPushFrame {
    #[getset(get_copy = "pub")]
    push_id: u64,
}

impl CancelPushFrame {
    ///Creates.
    pub fn new(push_id: u64) -> Self {
        Self { push_id }
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        encode_single_varint_frame(CANCEL_PUSH_FRAME_TYPE, self.push_id, writer)
    }
}

///DUPLICATE_PUSH frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct DuplicatePushFrame {
    #[getset(get_copy = "pub")]
    push_id: u64,
}

impl DuplicatePushFrame {
    ///Creates.
    pub fn new(push_id: u64) -> Self {
        Self { push_id }
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        encode_single_varint_frame(DUPLICATE_PUSH_FRAME_TYPE, self.push_id, writer)
    }
}

///PRIORITY_UPDATE frame. The payload is carried but not interpreted.
#[derive(Clone, Default, PartialEq, Eq, Getters)]
pub struct PriorityUpdateFrame {
    #[getset(get = "pub")]
    payload: Vec<u8>,
}

impl std::fmt::Debug for PriorityUpdateFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityUpdateFrame")
            .field("payload len", &self.payload.len())
            .finish()
    }
}

impl PriorityUpdateFrame {
    ///Creates with an opaque payload.
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    ///Encodes self into sequential bytes, returning None if no error.
    pub fn encode(&self, writer: &mut impl WriteByte) -> Option<Error> {
        fill_header(PRIORITY_UPDATE_FRAME_TYPE, self.payload.len(), writer);
        writer.put_all(&self.payload)
    }
}

///Encodes a DATA frame.
pub fn encode_data_frame(data: &[u8], writer: &mut impl WriteByte) -> Option<Error> {
    fill_header(DATA_FRAME_TYPE, data.len(), writer);
    writer.put_all(data)
}

///Encodes a HEADERS frame around an already encoded field section.
pub fn encode_headers_frame(encoded_field_section: &[u8], writer: &mut impl WriteByte) -> Option<Error> {
    fill_header(HEADERS_FRAME_TYPE, encoded_field_section.len(), writer);
    writer.put_all(encoded_field_section)
}

///Encodes a PUSH_PROMISE frame.
pub fn encode_push_promise_frame(
    push_id: u64,
    encoded_field_section: &[u8],
    writer: &mut impl WriteByte,
) -> Option<Error> {
    fill_header(
        PUSH_PROMISE_FRAME_TYPE,
        varint_len(push_id) + encoded_field_section.len(),
        writer,
    );
    encode_varint(push_id, writer);
    writer.put_all(encoded_field_section)
}

///Encodes a frame of any type with an opaque payload, such as a reserved or extension type.
pub fn encode_unknown_frame(frame_type: u64, payload: &[u8], writer: &mut impl WriteByte) -> Option<Error> {
    fill_header(frame_type, payload.len(), writer);
    writer.put_all(payload)
}

///Returns true for frame types this crate recognizes.
pub fn is_known_frame_type(frame_type: u64) -> bool {
    matches!(
        frame_type,
        DATA_FRAME_TYPE
            | HEADERS_FRAME_TYPE
            | CANCEL_PUSH_FRAME_TYPE
            | SETTINGS_FRAME_TYPE
            | PUSH_PROMISE_FRAME_TYPE
            | GOAWAY_FRAME_TYPE
            | MAX_PUSH_ID_FRAME_TYPE
            | DUPLICATE_PUSH_FRAME_TYPE
            | PRIORITY_UPDATE_FRAME_TYPE
    )
}
