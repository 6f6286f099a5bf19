//!Error codes and the control stream violation taxonomy.

use thiserror::Error;

///Connection error codes used when closing a connection.
///
///[`ErrorCode::NoError`] is the healthy sentinel reported by [`crate::frame::HttpDecoder::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    NoError,
    ///An internal consistency check failed.
    InternalError,
    ///A frame payload exceeded the limit for its type.
    HttpFrameTooLarge,
    ///A frame payload could not be parsed.
    HttpFrameError,
    ///A frame type that must not appear on the control stream was received.
    HttpFrameUnexpectedOnControlStream,
    ///A frame arrived in a state where it is not permitted, such as a second SETTINGS.
    HttpFrameUnexpected,
    ///A critical stream was closed or reset.
    HttpClosedCriticalStream,
    ///MAX_PUSH_ID lowered the previously advertised ceiling.
    HttpInvalidMaxPushId,
    ///GOAWAY raised the previously advertised stream id.
    HttpGoAwayIdLargerThanPrevious,
}

impl ErrorCode {
    ///Returns true for [`ErrorCode::NoError`].
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::NoError
    }

    ///Returns the HTTP/3 application error code (RFC 9114 section 8.1) carried on the wire.
    pub fn http3_wire_code(self) -> u64 {
        match self {
            Self::NoError => 0x100,
            Self::InternalError => 0x102,
            Self::HttpClosedCriticalStream => 0x104,
            Self::HttpFrameUnexpected | Self::HttpFrameUnexpectedOnControlStream => 0x105,
            Self::HttpFrameError => 0x106,
            Self::HttpFrameTooLarge => 0x107,
            Self::HttpInvalidMaxPushId | Self::HttpGoAwayIdLargerThanPrevious => 0x108,
        }
    }

    ///Returns the symbolic name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoError => "NO_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::HttpFrameTooLarge => "HTTP_FRAME_TOO_LARGE",
            Self::HttpFrameError => "HTTP_FRAME_ERROR",
            Self::HttpFrameUnexpectedOnControlStream => "HTTP_FRAME_UNEXPECTED_ON_CONTROL_STREAM",
            Self::HttpFrameUnexpected => "HTTP_FRAME_UNEXPECTED",
            Self::HttpClosedCriticalStream => "HTTP_CLOSED_CRITICAL_STREAM",
            Self::HttpInvalidMaxPushId => "HTTP_INVALID_MAX_PUSH_ID",
            Self::HttpGoAwayIdLargerThanPrevious => "HTTP_GOAWAY_ID_LARGER_THAN_PREVIOUS",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

///Frame families that are never legal on a receive control stream, or only legal for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFamily {
    Data,
    Headers,
    PushPromise,
    CancelPush,
    DuplicatePush,
    MaxPushId,
    GoAway,
}

impl FrameFamily {
    ///Returns the human readable name used in connection close details.
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::Headers => "Headers",
            Self::PushPromise => "Push Promise",
            Self::CancelPush => "Cancel Push",
            Self::DuplicatePush => "Duplicate Push",
            Self::MaxPushId => "Max Push Id",
            Self::GoAway => "Go Away",
        }
    }
}

impl std::fmt::Display for FrameFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

///A violation that closed the connection while processing the receive control stream.
///
///The `Display` output is the detail string sent with the connection close.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlStreamError {
    ///A frame that is forbidden on this stream, or for this role, was decoded.
    #[error("{family} frame received on control stream")]
    WrongFrame { family: FrameFamily },

    ///A second SETTINGS frame was started.
    #[error("Settings frames are received twice.")]
    DuplicateSettings,

    ///The peer reset the stream.
    #[error("Attempt to reset receive control stream")]
    StreamReset,

    ///The frame decoder rejected the bytes; code and detail are the decoder's own.
    #[error("{detail}")]
    Decode { code: ErrorCode, detail: String },

    ///The decoder broke its contract by stopping short without an error.
    #[error("{detail}")]
    Internal { detail: String },
}

impl ControlStreamError {
    ///Returns the code passed to the connection close.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::WrongFrame { .. } => ErrorCode::HttpFrameUnexpectedOnControlStream,
            Self::DuplicateSettings => ErrorCode::HttpFrameUnexpected,
            Self::StreamReset => ErrorCode::HttpClosedCriticalStream,
            Self::Decode { code, .. } => *code,
            Self::Internal { .. } => ErrorCode::InternalError,
        }
    }
}
