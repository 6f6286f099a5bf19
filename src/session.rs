/*!
The connection-side contract the receive control stream reports into.

[`SessionContext`] is what the control stream needs from its connection. [`Http3Session`]
is a small implementation that records peer state and the close reason.
*/

use crate::error::ErrorCode;
use crate::frame::{
    SettingsFrame, SETTINGS_MAX_HEADER_LIST_SIZE, SETTINGS_QPACK_BLOCKED_STREAMS,
    SETTINGS_QPACK_MAX_TABLE_CAPACITY,
};
use getset::{CopyGetters, Getters};
use tracing::{debug, info, warn};

///Which end of the connection this endpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Perspective {
    #[default]
    Client,
    Server,
}

///Whether closing a connection notifies the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionCloseBehavior {
    SilentClose,
    SendConnectionClosePacket,
}

///Observer for received control frames.
pub trait Http3DebugVisitor {
    ///Called once per accepted SETTINGS frame, before any setting is applied.
    fn on_settings_frame_received(&mut self, frame: &SettingsFrame);
}

///The connection as seen by the receive control stream.
pub trait SessionContext {
    ///Returns the local role.
    fn perspective(&self) -> Perspective;

    ///Returns false once the connection has been closed.
    fn is_connected(&self) -> bool;

    ///Closes the whole connection.
    fn close_connection(&mut self, code: ErrorCode, detail: &str, behavior: ConnectionCloseBehavior);

    ///Raises the ceiling on push ids the server may use. Only called on servers.
    fn set_max_allowed_push_id(&mut self, push_id: u64);

    ///Peer announced the last stream it will process. Only called on clients.
    fn on_goaway(&mut self, stream_id: u64);

    ///Applies one SETTINGS entry.
    fn on_setting(&mut self, id: u64, value: u64);

    ///Returns the debug visitor, if one is installed.
    fn debug_visitor(&mut self) -> Option<&mut dyn Http3DebugVisitor> {
        None
    }
}

///Configuration for [`Http3Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Http3SessionConfig {
    perspective: Perspective,
    ///Ceiling in force before the peer sends MAX_PUSH_ID.
    initial_max_push_id: Option<u64>,
}

impl Http3SessionConfig {
    ///Creates for a role.
    pub fn new(perspective: Perspective) -> Self {
        Self {
            perspective,
            initial_max_push_id: None,
        }
    }

    ///Sets the initial push id ceiling.
    pub fn with_initial_max_push_id(mut self, push_id: u64) -> Self {
        self.initial_max_push_id = Some(push_id);
        self
    }
}

///Settings the peer has announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct PeerSettings {
    qpack_max_table_capacity: Option<u64>,
    max_header_list_size: Option<u64>,
    qpack_blocked_streams: Option<u64>,
    ///Entries with identifiers this crate does not know.
    ignored: usize,
}

///Why a connection was closed.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters, Getters)]
pub struct ConnectionClose {
    #[getset(get_copy = "pub")]
    code: ErrorCode,
    #[getset(get = "pub")]
    detail: String,
    #[getset(get_copy = "pub")]
    behavior: ConnectionCloseBehavior,
}

///A connection's HTTP/3 state as driven by the peer's control stream.
#[derive(CopyGetters, Getters)]
pub struct Http3Session {
    perspective: Perspective,
    #[getset(get = "pub")]
    close: Option<ConnectionClose>,
    #[getset(get_copy = "pub")]
    max_allowed_push_id: Option<u64>,
    #[getset(get_copy = "pub")]
    last_received_goaway_id: Option<u64>,
    #[getset(get_copy = "pub")]
    peer_settings: PeerSettings,
    debug_visitor: Option<Box<dyn Http3DebugVisitor>>,
}

impl std::fmt::Debug for Http3Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Http3Session")
            .field("perspective", &self.perspective)
            .field("close", &self.close)
            .field("max_allowed_push_id", &self.max_allowed_push_id)
            .field("last_received_goaway_id", &self.last_received_goaway_id)
            .field("peer_settings", &self.peer_settings)
            .field("debug_visitor", &self.debug_visitor.is_some())
            .finish()
    }
}

impl Http3Session {
    ///Creates with a configuration.
    pub fn new(config: Http3SessionConfig) -> Self {
        Self {
            perspective: config.perspective(),
            close: None,
            max_allowed_push_id: config.initial_max_push_id(),
            last_received_goaway_id: None,
            peer_settings: PeerSettings::default(),
            debug_visitor: None,
        }
    }

    ///Installs a debug visitor.
    pub fn set_debug_visitor(&mut self, visitor: Box<dyn Http3DebugVisitor>) {
        self.debug_visitor = Some(visitor);
    }
}

impl SessionContext for Http3Session {
    fn perspective(&self) -> Perspective {
        self.perspective
    }

    fn is_connected(&self) -> bool {
        self.close.is_none()
    }

    fn close_connection(&mut self, code: ErrorCode, detail: &str, behavior: ConnectionCloseBehavior) {
        if self.close.is_some() {
            debug!(%code, detail, "connection already closed");
            return;
        }
        info!(%code, detail, ?behavior, "closing connection");
        self.close = Some(ConnectionClose {
            code,
            detail: detail.to_string(),
            behavior,
        });
    }

    fn set_max_allowed_push_id(&mut self, push_id: u64) {
        if let Some(current) = self.max_allowed_push_id {
            if push_id < current {
                warn!(push_id, current, "MAX_PUSH_ID decreased");
                let detail = format!(
                    "MAX_PUSH_ID received with value {} which is smaller than previously received value {}",
                    push_id, current
                );
                self.close_connection(
                    ErrorCode::HttpInvalidMaxPushId,
                    &detail,
                    ConnectionCloseBehavior::SendConnectionClosePacket,
                );
                return;
            }
        }
        self.max_allowed_push_id = Some(push_id);
    }

    fn on_goaway(&mut self, stream_id: u64) {
        if let Some(previous) = self.last_received_goaway_id {
            if stream_id > previous {
                warn!(stream_id, previous, "GOAWAY id increased");
                let detail = format!(
                    "GOAWAY received with ID {} greater than previously received ID {}",
                    stream_id, previous
                );
                self.close_connection(
                    ErrorCode::HttpGoAwayIdLargerThanPrevious,
                    &detail,
                    ConnectionCloseBehavior::SendConnectionClosePacket,
                );
                return;
            }
        }
        info!(stream_id, "GOAWAY received");
        self.last_received_goaway_id = Some(stream_id);
    }

    fn on_setting(&mut self, id: u64, value: u64) {
        let settings = &mut self.peer_settings;
        match id {
            SETTINGS_QPACK_MAX_TABLE_CAPACITY => settings.qpack_max_table_capacity = Some(value),
            SETTINGS_MAX_HEADER_LIST_SIZE => settings.max_header_list_size = Some(value),
            SETTINGS_QPACK_BLOCKED_STREAMS => settings.qpack_blocked_streams = Some(value),
            _ => {
                debug!(id, value, "ignoring unknown setting");
                settings.ignored += 1;
                return;
            }
        }
        debug!(id, value, "applied setting");
    }

    fn debug_visitor(&mut self) -> Option<&mut dyn Http3DebugVisitor> {
        self.debug_visitor
            .as_mut()
            .map(|visitor| visitor.as_mut() as &mut dyn Http3DebugVisitor)
    }
}
