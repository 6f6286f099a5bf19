//!The receiving side of an HTTP/3 control stream.
//!
//!The peer opens one unidirectional control stream per connection. Its first
//!frame must be SETTINGS, and only a handful of frame types may follow.
//![`ReceiveControlStream`] decodes the stream incrementally with [`HttpDecoder`],
//!checks every frame against those rules and reports accepted frames to a
//![`SessionContext`]. Anything else closes the connection.
//!
//!```
//!use h3control::{
//!    GoAwayFrame, Http3Session, Http3SessionConfig, PendingStream, Perspective,
//!    ReceiveControlStream, SessionContext, SettingsFrame,
//!};
//!
//!let mut bytes = Vec::new();
//!SettingsFrame::with_values(vec![(0x01, 4096)]).encode(&mut bytes);
//!GoAwayFrame::new(9).encode(&mut bytes);
//!
//!let mut session = Http3Session::new(Http3SessionConfig::new(Perspective::Client));
//!let mut stream = ReceiveControlStream::new(PendingStream::new(3));
//!stream.sequencer_mut().on_stream_frame(0, &bytes, false).unwrap();
//!stream.on_data_available(&mut session).unwrap();
//!
//!assert!(session.is_connected());
//!assert_eq!(session.last_received_goaway_id(), Some(9));
//!```
//!

mod control;
mod error;
mod frame;
mod io;
mod sequencer;
mod session;
mod stream;
pub mod testing;
mod varint;

pub use control::*;
pub use error::*;
pub use frame::*;
pub use io::*;
pub use sequencer::*;
pub use session::*;
pub use stream::*;
pub use varint::*;

#[cfg(test)]
pub(crate) fn init_test_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}
