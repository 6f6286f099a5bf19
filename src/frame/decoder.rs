use super::*;
use crate::error::ErrorCode;
use crate::varint::{VarintReader, MAX_VARINT_LENGTH};
use getset::CopyGetters;

///Default limit for SETTINGS and PRIORITY_UPDATE payloads, which are buffered whole.
pub const DEFAULT_MAX_BUFFERED_PAYLOAD: u64 = 1024 * 1024;

///One step of decoding, handed to a [`DistributeFrameEvents`].
///
///`header_length` is the combined length of the type and length fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent<'a> {
    DataStart { header_length: usize },
    DataPayload(&'a [u8]),
    DataEnd,
    HeadersStart { header_length: usize },
    HeadersPayload(&'a [u8]),
    HeadersEnd,
    PushPromiseStart { header_length: usize },
    PushPromisePushId { push_id: u64, push_id_length: usize },
    PushPromisePayload(&'a [u8]),
    PushPromiseEnd,
    CancelPush(CancelPushFrame),
    SettingsStart { header_length: usize },
    Settings(SettingsFrame),
    GoAway(GoAwayFrame),
    MaxPushId(MaxPushIdFrame),
    DuplicatePush(DuplicatePushFrame),
    PriorityUpdateStart { header_length: usize },
    PriorityUpdate(PriorityUpdateFrame),
    UnknownStart { frame_type: u64, header_length: usize },
    UnknownPayload(&'a [u8]),
    UnknownEnd,
}

///A trait for receiving decoded frames.
pub trait DistributeFrameEvents {
    ///Handles one event. Returning false pauses the decoder after this event.
    fn frame_event(&mut self, event: FrameEvent<'_>) -> bool;

    ///Called once when the decoder enters its terminal error state.
    fn decode_error(&mut self, code: ErrorCode, detail: &str);
}

///Limits applied by [`HttpDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct HttpDecoderOptions {
    ///Largest SETTINGS or PRIORITY_UPDATE payload accepted.
    #[getset(get_copy = "pub")]
    max_buffered_payload: u64,
}

impl Default for HttpDecoderOptions {
    fn default() -> Self {
        Self {
            max_buffered_payload: DEFAULT_MAX_BUFFERED_PAYLOAD,
        }
    }
}

impl HttpDecoderOptions {
    ///Creates with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    ///Sets the largest buffered payload.
    pub fn with_max_buffered_payload(mut self, n: u64) -> Self {
        self.max_buffered_payload = n;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    ReadingFrameType,
    ReadingFrameLength,
    ReadingFramePayload,
    FinishParsing,
    Error,
}

///Incremental HTTP/3 frame decoder.
///
///Partial frames are kept across calls to [`HttpDecoder::process_input`]; the
///caller only has to keep feeding bytes. Errors are terminal.
pub struct HttpDecoder {
    options: HttpDecoderOptions,
    state: DecoderState,
    varint: VarintReader,
    current_frame_type: u64,
    current_type_field_length: usize,
    current_frame_length: u64,
    remaining_frame_length: u64,
    push_id_read: bool,
    buffer: Vec<u8>,
    error: ErrorCode,
    error_detail: String,
}

impl std::fmt::Debug for HttpDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDecoder")
            .field("state", &self.state)
            .field("current_frame_type", &self.current_frame_type)
            .field("remaining_frame_length", &self.remaining_frame_length)
            .field("buffer len", &self.buffer.len())
            .field("error", &self.error)
            .field("error_detail", &self.error_detail)
            .finish()
    }
}

impl Default for HttpDecoder {
    fn default() -> Self {
        Self::new(HttpDecoderOptions::default())
    }
}

impl HttpDecoder {
    ///Creates with options.
    pub fn new(options: HttpDecoderOptions) -> Self {
        Self {
            options,
            state: DecoderState::ReadingFrameType,
            varint: VarintReader::default(),
            current_frame_type: 0,
            current_type_field_length: 0,
            current_frame_length: 0,
            remaining_frame_length: 0,
            push_id_read: false,
            buffer: Vec::new(),
            error: ErrorCode::NoError,
            error_detail: String::new(),
        }
    }

    ///Returns the error code, [`ErrorCode::NoError`] while healthy.
    pub fn error(&self) -> ErrorCode {
        self.error
    }

    ///Returns the error detail, empty while healthy.
    pub fn error_detail(&self) -> &str {
        &self.error_detail
    }

    ///Returns the options.
    pub fn options(&self) -> HttpDecoderOptions {
        self.options
    }

    ///Returns true when no frame is partially decoded.
    pub fn at_frame_boundary(&self) -> bool {
        self.state == DecoderState::ReadingFrameType && !self.varint.in_progress()
    }

    ///Decodes as much of `data` as possible, returning the number of bytes consumed.
    ///
    ///Consumes everything unless the visitor paused decoding or an error was raised.
    pub fn process_input(&mut self, data: &[u8], visitor: &mut impl DistributeFrameEvents) -> usize {
        if !self.error.is_ok() {
            return 0;
        }
        let mut reader = data;
        let mut continue_processing = true;
        while continue_processing
            && (reader.has_surplus() || self.state == DecoderState::FinishParsing)
        {
            continue_processing = match self.state {
                DecoderState::ReadingFrameType => {
                    self.read_frame_type(&mut reader);
                    true
                }
                DecoderState::ReadingFrameLength => self.read_frame_length(&mut reader, visitor),
                DecoderState::ReadingFramePayload => self.read_frame_payload(&mut reader, visitor),
                DecoderState::FinishParsing => self.finish_parsing(visitor),
                DecoderState::Error => false,
            };
        }
        data.len() - reader.surplus()
    }

    fn read_frame_type(&mut self, reader: &mut &[u8]) {
        if let Some((frame_type, length)) = self.varint.read(reader) {
            self.current_frame_type = frame_type;
            self.current_type_field_length = length;
            self.state = DecoderState::ReadingFrameLength;
        }
    }

    fn read_frame_length(&mut self, reader: &mut &[u8], visitor: &mut impl DistributeFrameEvents) -> bool {
        let Some((frame_length, length_field_length)) = self.varint.read(reader) else {
            return true;
        };
        self.current_frame_length = frame_length;
        self.remaining_frame_length = frame_length;
        self.push_id_read = false;

        if frame_length > self.max_frame_length() {
            return self.raise_error(ErrorCode::HttpFrameTooLarge, "Frame is too large.", visitor);
        }

        self.state = if frame_length == 0 {
            DecoderState::FinishParsing
        } else {
            DecoderState::ReadingFramePayload
        };

        let header_length = self.current_type_field_length + length_field_length;
        match self.current_frame_type {
            DATA_FRAME_TYPE => visitor.frame_event(FrameEvent::DataStart { header_length }),
            HEADERS_FRAME_TYPE => visitor.frame_event(FrameEvent::HeadersStart { header_length }),
            PUSH_PROMISE_FRAME_TYPE => {
                visitor.frame_event(FrameEvent::PushPromiseStart { header_length })
            }
            SETTINGS_FRAME_TYPE => visitor.frame_event(FrameEvent::SettingsStart { header_length }),
            PRIORITY_UPDATE_FRAME_TYPE => {
                visitor.frame_event(FrameEvent::PriorityUpdateStart { header_length })
            }
            CANCEL_PUSH_FRAME_TYPE
            | GOAWAY_FRAME_TYPE
            | MAX_PUSH_ID_FRAME_TYPE
            | DUPLICATE_PUSH_FRAME_TYPE => true,
            frame_type => visitor.frame_event(FrameEvent::UnknownStart {
                frame_type,
                header_length,
            }),
        }
    }

    fn read_frame_payload(&mut self, reader: &mut &[u8], visitor: &mut impl DistributeFrameEvents) -> bool {
        let continue_processing = match self.current_frame_type {
            DATA_FRAME_TYPE => {
                let payload = self.take_payload(reader);
                visitor.frame_event(FrameEvent::DataPayload(payload))
            }
            HEADERS_FRAME_TYPE => {
                let payload = self.take_payload(reader);
                visitor.frame_event(FrameEvent::HeadersPayload(payload))
            }
            PUSH_PROMISE_FRAME_TYPE => {
                if self.push_id_read {
                    let payload = self.take_payload(reader);
                    visitor.frame_event(FrameEvent::PushPromisePayload(payload))
                } else {
                    return self.read_push_id(reader, visitor);
                }
            }
            CANCEL_PUSH_FRAME_TYPE
            | SETTINGS_FRAME_TYPE
            | GOAWAY_FRAME_TYPE
            | MAX_PUSH_ID_FRAME_TYPE
            | DUPLICATE_PUSH_FRAME_TYPE
            | PRIORITY_UPDATE_FRAME_TYPE => {
                let payload = self.take_payload(reader);
                self.buffer.extend_from_slice(payload);
                true
            }
            _ => {
                let payload = self.take_payload(reader);
                visitor.frame_event(FrameEvent::UnknownPayload(payload))
            }
        };
        if self.remaining_frame_length == 0 {
            self.state = DecoderState::FinishParsing;
        }
        continue_processing
    }

    fn read_push_id(&mut self, reader: &mut &[u8], visitor: &mut impl DistributeFrameEvents) -> bool {
        let available = self.remaining_frame_length.min(reader.len() as u64) as usize;
        let mut limited = &reader[..available];
        let result = self.varint.read(&mut limited);
        let consumed = available - limited.len();
        reader.advance(consumed);
        self.remaining_frame_length -= consumed as u64;

        // The push id leads the payload, so it must fit in the declared frame length.
        if let Some(length) = self.varint.pending_length() {
            if length as u64 > self.current_frame_length {
                return self.raise_error(
                    ErrorCode::HttpFrameError,
                    "Unable to read PUSH_PROMISE push_id.",
                    visitor,
                );
            }
        }

        let Some((push_id, push_id_length)) = result else {
            return true;
        };
        self.push_id_read = true;
        if self.remaining_frame_length == 0 {
            self.state = DecoderState::FinishParsing;
        }
        visitor.frame_event(FrameEvent::PushPromisePushId {
            push_id,
            push_id_length,
        })
    }

    fn finish_parsing(&mut self, visitor: &mut impl DistributeFrameEvents) -> bool {
        let continue_processing = match self.current_frame_type {
            DATA_FRAME_TYPE => visitor.frame_event(FrameEvent::DataEnd),
            HEADERS_FRAME_TYPE => visitor.frame_event(FrameEvent::HeadersEnd),
            PUSH_PROMISE_FRAME_TYPE => {
                if !self.push_id_read {
                    return self.raise_error(
                        ErrorCode::HttpFrameError,
                        "Unable to read PUSH_PROMISE push_id.",
                        visitor,
                    );
                }
                visitor.frame_event(FrameEvent::PushPromiseEnd)
            }
            CANCEL_PUSH_FRAME_TYPE => match self.parse_push_id("CANCEL_PUSH", visitor) {
                Some(push_id) => visitor.frame_event(FrameEvent::CancelPush(CancelPushFrame::new(push_id))),
                None => return false,
            },
            SETTINGS_FRAME_TYPE => match SettingsFrame::parse(&self.buffer) {
                Ok(frame) => visitor.frame_event(FrameEvent::Settings(frame)),
                Err(detail) => return self.raise_error(ErrorCode::HttpFrameError, detail, visitor),
            },
            GOAWAY_FRAME_TYPE => match parse_single_varint(&self.buffer) {
                Ok(stream_id) => visitor.frame_event(FrameEvent::GoAway(GoAwayFrame::new(stream_id))),
                Err(SingleVarintError::Unreadable) => {
                    return self.raise_error(
                        ErrorCode::HttpFrameError,
                        "Unable to read GOAWAY stream_id.",
                        visitor,
                    )
                }
                Err(SingleVarintError::Superfluous) => {
                    return self.raise_error(
                        ErrorCode::HttpFrameError,
                        "Superfluous data in GOAWAY frame.",
                        visitor,
                    )
                }
            },
            MAX_PUSH_ID_FRAME_TYPE => match self.parse_push_id("MAX_PUSH_ID", visitor) {
                Some(push_id) => visitor.frame_event(FrameEvent::MaxPushId(MaxPushIdFrame::new(push_id))),
                None => return false,
            },
            DUPLICATE_PUSH_FRAME_TYPE => match self.parse_push_id("DUPLICATE_PUSH", visitor) {
                Some(push_id) => {
                    visitor.frame_event(FrameEvent::DuplicatePush(DuplicatePushFrame::new(push_id)))
                }
                None => return false,
            },
            PRIORITY_UPDATE_FRAME_TYPE => {
                let payload = std::mem::take(&mut self.buffer);
                visitor.frame_event(FrameEvent::PriorityUpdate(PriorityUpdateFrame::new(payload)))
            }
            _ => visitor.frame_event(FrameEvent::UnknownEnd),
        };
        self.reset_for_next_frame();
        continue_processing
    }

    fn parse_push_id(&mut self, frame_name: &str, visitor: &mut impl DistributeFrameEvents) -> Option<u64> {
        match parse_single_varint(&self.buffer) {
            Ok(push_id) => Some(push_id),
            Err(SingleVarintError::Unreadable) => {
                let detail = format!("Unable to read {} push_id.", frame_name);
                self.raise_error(ErrorCode::HttpFrameError, &detail, visitor);
                None
            }
            Err(SingleVarintError::Superfluous) => {
                let detail = format!("Superfluous data in {} frame.", frame_name);
                self.raise_error(ErrorCode::HttpFrameError, &detail, visitor);
                None
            }
        }
    }

    #[inline]
    fn take_payload<'a>(&mut self, reader: &mut &'a [u8]) -> &'a [u8] {
        let n = self.remaining_frame_length.min(reader.len() as u64) as usize;
        let whole: &'a [u8] = *reader;
        let (payload, rest) = whole.split_at(n);
        *reader = rest;
        self.remaining_frame_length -= n as u64;
        payload
    }

    fn max_frame_length(&self) -> u64 {
        match self.current_frame_type {
            CANCEL_PUSH_FRAME_TYPE
            | GOAWAY_FRAME_TYPE
            | MAX_PUSH_ID_FRAME_TYPE
            | DUPLICATE_PUSH_FRAME_TYPE => MAX_VARINT_LENGTH as u64,
            SETTINGS_FRAME_TYPE | PRIORITY_UPDATE_FRAME_TYPE => self.options.max_buffered_payload,
            _ => u64::MAX,
        }
    }

    fn reset_for_next_frame(&mut self) {
        self.buffer.clear();
        self.push_id_read = false;
        if self.state != DecoderState::Error {
            self.state = DecoderState::ReadingFrameType;
        }
    }

    fn raise_error(&mut self, code: ErrorCode, detail: &str, visitor: &mut impl DistributeFrameEvents) -> bool {
        self.state = DecoderState::Error;
        self.error = code;
        self.error_detail = detail.to_string();
        visitor.decode_error(code, detail);
        false
    }
}
