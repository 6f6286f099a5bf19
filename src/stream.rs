//!Transport-level stream handles.

use crate::sequencer::StreamSequencer;
use getset::{CopyGetters, Getters, MutGetters};

///Direction of a stream from the local endpoint's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Bidirectional,
    ReadUnidirectional,
    WriteUnidirectional,
}

///A peer-initiated stream whose type has been read but which has no owner yet.
#[derive(Debug, Default, CopyGetters, Getters, MutGetters)]
pub struct PendingStream {
    #[getset(get_copy = "pub")]
    id: u64,
    #[getset(get = "pub", get_mut = "pub")]
    sequencer: StreamSequencer,
}

impl PendingStream {
    ///Creates with an empty sequencer.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            sequencer: StreamSequencer::new(),
        }
    }

    ///Creates over data that already arrived.
    pub fn with_sequencer(id: u64, sequencer: StreamSequencer) -> Self {
        Self { id, sequencer }
    }

    pub(crate) fn into_parts(self) -> (u64, StreamSequencer) {
        (self.id, self.sequencer)
    }
}

///RESET_STREAM received from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RstStreamFrame {
    stream_id: u64,
    error_code: u64,
    final_size: u64,
}

impl RstStreamFrame {
    ///Creates.
    pub fn new(stream_id: u64, error_code: u64, final_size: u64) -> Self {
        Self {
            stream_id,
            error_code,
            final_size,
        }
    }
}
