use crate::error::{ControlStreamError, ErrorCode, FrameFamily};
use crate::frame::{DistributeFrameEvents, FrameEvent, SettingsFrame};
use crate::session::{ConnectionCloseBehavior, Perspective, SessionContext};
use tracing::{debug, trace, warn};

///Validates frames decoded from the receive control stream and routes them to the session.
///
///Lives for one decode call; the only state it touches across calls is the
///borrowed `settings_received` flag. Decoding pauses as soon as the session
///is no longer connected.
pub(crate) struct ControlFrameDispatcher<'a, S: SessionContext + ?Sized> {
    stream_id: u64,
    settings_received: &'a mut bool,
    session: &'a mut S,
    violation: Option<ControlStreamError>,
    #[cfg(test)]
    pub(crate) pause_on_unknown: bool,
}

impl<'a, S: SessionContext + ?Sized> ControlFrameDispatcher<'a, S> {
    pub(crate) fn new(stream_id: u64, settings_received: &'a mut bool, session: &'a mut S) -> Self {
        Self {
            stream_id,
            settings_received,
            session,
            violation: None,
            #[cfg(test)]
            pause_on_unknown: false,
        }
    }

    ///Returns the violation that closed the connection, if any.
    pub(crate) fn into_violation(self) -> Option<ControlStreamError> {
        self.violation
    }

    fn close_connection(&mut self, violation: ControlStreamError) -> bool {
        let code = violation.error_code();
        let detail = violation.to_string();
        warn!(
            stream_id = self.stream_id,
            %code,
            detail = %detail,
            "closing connection on control stream violation"
        );
        self.session.close_connection(
            code,
            &detail,
            ConnectionCloseBehavior::SendConnectionClosePacket,
        );
        self.violation.get_or_insert(violation);
        false
    }

    #[cfg(test)]
    fn pauses_on_unknown(&self) -> bool {
        self.pause_on_unknown
    }

    #[cfg(not(test))]
    fn pauses_on_unknown(&self) -> bool {
        false
    }

    fn wrong_frame(&mut self, family: FrameFamily) -> bool {
        self.close_connection(ControlStreamError::WrongFrame { family })
    }

    fn on_settings_frame_start(&mut self) -> bool {
        if *self.settings_received {
            return self.close_connection(ControlStreamError::DuplicateSettings);
        }
        *self.settings_received = true;
        true
    }

    fn on_settings_frame(&mut self, frame: &SettingsFrame) -> bool {
        debug!(
            stream_id = self.stream_id,
            "Control Stream received settings frame: {}", frame
        );
        if let Some(visitor) = self.session.debug_visitor() {
            visitor.on_settings_frame_received(frame);
        }
        for (id, value) in frame.values() {
            self.session.on_setting(*id, *value);
        }
        self.session.is_connected()
    }
}

impl<'a, S: SessionContext + ?Sized> DistributeFrameEvents for ControlFrameDispatcher<'a, S> {
    fn frame_event(&mut self, event: FrameEvent<'_>) -> bool {
        match event {
            FrameEvent::CancelPush(_) => self.wrong_frame(FrameFamily::CancelPush),
            FrameEvent::MaxPushId(frame) => {
                if self.session.perspective() == Perspective::Server {
                    self.session.set_max_allowed_push_id(frame.push_id());
                    self.session.is_connected()
                } else {
                    self.wrong_frame(FrameFamily::MaxPushId)
                }
            }
            FrameEvent::GoAway(frame) => {
                if self.session.perspective() == Perspective::Server {
                    self.wrong_frame(FrameFamily::GoAway)
                } else {
                    self.session.on_goaway(frame.stream_id());
                    self.session.is_connected()
                }
            }
            FrameEvent::SettingsStart { .. } => self.on_settings_frame_start(),
            FrameEvent::Settings(frame) => self.on_settings_frame(&frame),
            FrameEvent::DuplicatePush(_) => self.wrong_frame(FrameFamily::DuplicatePush),
            FrameEvent::DataStart { .. } | FrameEvent::DataPayload(_) | FrameEvent::DataEnd => {
                self.wrong_frame(FrameFamily::Data)
            }
            FrameEvent::HeadersStart { .. }
            | FrameEvent::HeadersPayload(_)
            | FrameEvent::HeadersEnd => self.wrong_frame(FrameFamily::Headers),
            FrameEvent::PushPromiseStart { .. }
            | FrameEvent::PushPromisePushId { .. }
            | FrameEvent::PushPromisePayload(_)
            | FrameEvent::PushPromiseEnd => self.wrong_frame(FrameFamily::PushPromise),
            // TODO: feed PRIORITY_UPDATE into stream prioritization once the session schedules by priority.
            FrameEvent::PriorityUpdateStart { .. } => true,
            FrameEvent::PriorityUpdate(frame) => {
                trace!(stream_id = self.stream_id, ?frame, "ignoring PRIORITY_UPDATE");
                true
            }
            FrameEvent::UnknownStart { frame_type, .. } => {
                trace!(stream_id = self.stream_id, frame_type, "ignoring unknown frame");
                !self.pauses_on_unknown()
            }
            FrameEvent::UnknownPayload(_) | FrameEvent::UnknownEnd => true,
        }
    }

    fn decode_error(&mut self, code: ErrorCode, detail: &str) {
        self.close_connection(ControlStreamError::Decode {
            code,
            detail: detail.to_string(),
        });
    }
}
