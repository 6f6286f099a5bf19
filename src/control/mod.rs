/*!
The peer's HTTP/3 control stream.

Each connection has exactly one receive control stream. It is static: it never
counts towards stream limits and it must stay open for the connection's
lifetime. [`ReceiveControlStream`] reads it, and any frame that is not allowed
on it closes the whole connection.

```
use h3control::{
    Http3Session, Http3SessionConfig, PendingStream, Perspective, ReceiveControlStream,
    SessionContext, SettingsFrame,
};

let mut bytes = Vec::new();
SettingsFrame::with_values(vec![(0x06, 16384)]).encode(&mut bytes);

let mut pending = PendingStream::new(3);
pending.sequencer_mut().on_stream_frame(0, &bytes, false).unwrap();

let mut session = Http3Session::new(Http3SessionConfig::new(Perspective::Client));
let mut stream = ReceiveControlStream::new(pending);
stream.on_data_available(&mut session).unwrap();

assert!(session.is_connected());
assert_eq!(session.peer_settings().max_header_list_size(), Some(16384));
```
*/

mod dispatcher;

use crate::error::{ControlStreamError, ErrorCode};
use crate::frame::{HttpDecoder, HttpDecoderOptions};
use crate::sequencer::StreamSequencer;
use crate::session::{ConnectionCloseBehavior, SessionContext};
use crate::stream::{PendingStream, RstStreamFrame, StreamType};
use dispatcher::ControlFrameDispatcher;
use tracing::{error, warn};

///Where a receive control stream is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlStreamState {
    ///No SETTINGS frame has started yet.
    AwaitingSettings,
    ///The SETTINGS frame has started; every other legal frame is accepted.
    SettingsEstablished,
    ///A violation closed the connection. Nothing more is read.
    ConnectionClosed,
}

///Receiving end of the peer's control stream.
pub struct ReceiveControlStream {
    id: u64,
    settings_received: bool,
    decoder: HttpDecoder,
    sequencer: StreamSequencer,
    reading_stopped: bool,
    #[cfg(test)]
    pause_on_unknown: bool,
}

impl std::fmt::Debug for ReceiveControlStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiveControlStream")
            .field("id", &self.id)
            .field("settings_received", &self.settings_received)
            .field("reading_stopped", &self.reading_stopped)
            .field("bytes consumed", &self.sequencer.num_bytes_consumed())
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl ReceiveControlStream {
    ///Creates over a pending stream with default decoder limits.
    pub fn new(pending: PendingStream) -> Self {
        Self::with_options(pending, HttpDecoderOptions::default())
    }

    ///Creates over a pending stream with explicit decoder limits.
    pub fn with_options(pending: PendingStream, options: HttpDecoderOptions) -> Self {
        let (id, mut sequencer) = pending.into_parts();
        // Buffered data is delivered as a whole on every notification.
        sequencer.set_level_triggered(true);
        Self {
            id,
            settings_received: false,
            decoder: HttpDecoder::new(options),
            sequencer,
            reading_stopped: false,
            #[cfg(test)]
            pause_on_unknown: false,
        }
    }

    ///Returns the stream id.
    pub fn id(&self) -> u64 {
        self.id
    }

    ///Always read-unidirectional.
    pub fn stream_type(&self) -> StreamType {
        StreamType::ReadUnidirectional
    }

    ///Always true: the control stream is critical and excluded from stream limits.
    pub fn is_static(&self) -> bool {
        true
    }

    ///Returns true once a SETTINGS frame has started.
    pub fn settings_received(&self) -> bool {
        self.settings_received
    }

    ///Returns true once reading has been stopped.
    pub fn reading_stopped(&self) -> bool {
        self.reading_stopped
    }

    ///Stops reading; buffered data is left in place.
    pub fn stop_reading(&mut self) {
        self.reading_stopped = true;
    }

    ///Returns the decoder.
    pub fn decoder(&self) -> &HttpDecoder {
        &self.decoder
    }

    ///Returns the sequencer the transport writes stream frames into.
    pub fn sequencer_mut(&mut self) -> &mut StreamSequencer {
        &mut self.sequencer
    }

    ///Returns the sequencer.
    pub fn sequencer(&self) -> &StreamSequencer {
        &self.sequencer
    }

    ///Returns the current state.
    pub fn state(&self) -> ControlStreamState {
        if self.reading_stopped || !self.decoder.error().is_ok() {
            ControlStreamState::ConnectionClosed
        } else if self.settings_received {
            ControlStreamState::SettingsEstablished
        } else {
            ControlStreamState::AwaitingSettings
        }
    }

    ///Decodes everything readable and applies it to the session.
    ///
    ///Stops early once the session is no longer connected. Returns the
    ///violation that closed the connection during this call.
    pub fn on_data_available<S>(&mut self, session: &mut S) -> Result<(), ControlStreamError>
    where
        S: SessionContext + ?Sized,
    {
        while !self.reading_stopped && self.decoder.error().is_ok() {
            let Some(region) = self.sequencer.readable_region() else {
                break;
            };
            debug_assert!(!self.sequencer.is_closed());
            let region_length = region.len();

            let mut dispatcher =
                ControlFrameDispatcher::new(self.id, &mut self.settings_received, &mut *session);
            #[cfg(test)]
            {
                dispatcher.pause_on_unknown = self.pause_on_unknown;
            }
            let processed = self.decoder.process_input(region, &mut dispatcher);
            let violation = dispatcher.into_violation();
            self.sequencer.mark_consumed(processed);

            if let Some(violation) = violation {
                self.reading_stopped = true;
                return Err(violation);
            }
            if !session.is_connected() {
                self.reading_stopped = true;
                return Ok(());
            }

            // The decoder only stops short on error, and every error closes the connection.
            if processed != region_length {
                error!(
                    stream_id = self.id,
                    processed, region_length, "decoder stopped without an error"
                );
                let violation = ControlStreamError::Internal {
                    detail: format!(
                        "Control stream decoder consumed {} of {} bytes without an error",
                        processed, region_length
                    ),
                };
                session.close_connection(
                    violation.error_code(),
                    &violation.to_string(),
                    ConnectionCloseBehavior::SendConnectionClosePacket,
                );
                self.reading_stopped = true;
                return Err(violation);
            }
        }
        Ok(())
    }

    ///Handles RESET_STREAM from the peer, which is never allowed on the control stream.
    pub fn on_stream_reset<S>(&mut self, frame: &RstStreamFrame, session: &mut S)
    where
        S: SessionContext + ?Sized,
    {
        let violation = ControlStreamError::StreamReset;
        warn!(
            stream_id = self.id,
            error_code = frame.error_code(),
            "peer reset the receive control stream"
        );
        debug_assert_eq!(violation.error_code(), ErrorCode::HttpClosedCriticalStream);
        session.close_connection(
            violation.error_code(),
            &violation.to_string(),
            ConnectionCloseBehavior::SendConnectionClosePacket,
        );
        self.reading_stopped = true;
    }
}

#[cfg(test)]
mod tests;
