/*!
A [`SessionContext`] that records every call, for driving a receive control stream by hand.

```
use h3control::testing::{RecordingSession, SessionCall};
use h3control::{PendingStream, Perspective, ReceiveControlStream, MaxPushIdFrame, SettingsFrame};

let mut bytes = Vec::new();
SettingsFrame::new().encode(&mut bytes);
MaxPushIdFrame::new(3).encode(&mut bytes);

let mut pending = PendingStream::new(2);
pending.sequencer_mut().on_stream_frame(0, &bytes, false).unwrap();

let mut session = RecordingSession::new(Perspective::Server);
let mut stream = ReceiveControlStream::new(pending);
stream.on_data_available(&mut session).unwrap();
assert_eq!(session.calls(), &[SessionCall::MaxAllowedPushId(3)]);
```
*/

use crate::error::ErrorCode;
use crate::frame::SettingsFrame;
use crate::session::{ConnectionCloseBehavior, Http3DebugVisitor, Perspective, SessionContext};

///One call made into a [`RecordingSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    MaxAllowedPushId(u64),
    GoAway(u64),
    Setting(u64, u64),
    SettingsFrameReceived(SettingsFrame),
    Close {
        code: ErrorCode,
        detail: String,
        behavior: ConnectionCloseBehavior,
    },
}

///Records calls in order. Closing disconnects it; later closes are recorded too.
#[derive(Debug)]
pub struct RecordingSession {
    perspective: Perspective,
    connected: bool,
    debug_visitor: bool,
    calls: Vec<SessionCall>,
}

impl RecordingSession {
    ///Creates a connected session without a debug visitor.
    pub fn new(perspective: Perspective) -> Self {
        Self {
            perspective,
            connected: true,
            debug_visitor: false,
            calls: Vec::new(),
        }
    }

    ///Records SETTINGS frames handed to the debug visitor as well.
    pub fn with_debug_visitor(mut self) -> Self {
        self.debug_visitor = true;
        self
    }

    ///Returns the calls made so far.
    pub fn calls(&self) -> &[SessionCall] {
        &self.calls
    }

    ///Returns and forgets the calls made so far.
    pub fn take_calls(&mut self) -> Vec<SessionCall> {
        std::mem::take(&mut self.calls)
    }

    ///Returns every close call as `(code, detail)`.
    pub fn closes(&self) -> Vec<(ErrorCode, &str)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SessionCall::Close { code, detail, .. } => Some((*code, detail.as_str())),
                _ => None,
            })
            .collect()
    }

    ///Marks the connection closed without recording a call.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }
}

impl SessionContext for RecordingSession {
    fn perspective(&self) -> Perspective {
        self.perspective
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close_connection(&mut self, code: ErrorCode, detail: &str, behavior: ConnectionCloseBehavior) {
        self.connected = false;
        self.calls.push(SessionCall::Close {
            code,
            detail: detail.to_string(),
            behavior,
        });
    }

    fn set_max_allowed_push_id(&mut self, push_id: u64) {
        self.calls.push(SessionCall::MaxAllowedPushId(push_id));
    }

    fn on_goaway(&mut self, stream_id: u64) {
        self.calls.push(SessionCall::GoAway(stream_id));
    }

    fn on_setting(&mut self, id: u64, value: u64) {
        self.calls.push(SessionCall::Setting(id, value));
    }

    fn debug_visitor(&mut self) -> Option<&mut dyn Http3DebugVisitor> {
        if self.debug_visitor {
            Some(self as &mut dyn Http3DebugVisitor)
        } else {
            None
        }
    }
}

impl Http3DebugVisitor for RecordingSession {
    fn on_settings_frame_received(&mut self, frame: &SettingsFrame) {
        self.calls.push(SessionCall::SettingsFrameReceived(frame.clone()));
    }
}
