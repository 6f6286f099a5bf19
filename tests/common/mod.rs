#![allow(dead_code)]
//!Shared integration test utilities.
//!
//!Import with:
//!```ignore
//!mod common;
//!use common::*;
//!```

use h3control::testing::RecordingSession;
use h3control::{PendingStream, Perspective, ReceiveControlStream};
use proptest::prelude::ProptestConfig;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

///Number of cases each property runs unless `H3CONTROL_PROPTEST_CASES` says otherwise.
pub const DEFAULT_PROPTEST_CASES: u32 = 256;

const PROPTEST_CASES_ENV: &str = "H3CONTROL_PROPTEST_CASES";

///Initialize test logging once per test binary.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

///Proptest configuration honoring the case count override.
pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var(PROPTEST_CASES_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);
    ProptestConfig::with_cases(cases)
}

///A fresh control stream with id 3 and nothing buffered.
pub fn empty_stream() -> ReceiveControlStream {
    init_test_logging();
    ReceiveControlStream::new(PendingStream::new(3))
}

///Feeds `bytes` to a new stream in one delivery and returns the session afterwards.
pub fn deliver_whole(bytes: &[u8], perspective: Perspective) -> RecordingSession {
    let mut stream = empty_stream();
    let mut session = RecordingSession::new(perspective).with_debug_visitor();
    stream
        .sequencer_mut()
        .on_stream_frame(0, bytes, false)
        .expect("in-order data is accepted");
    let _ = stream.on_data_available(&mut session);
    session
}

///Feeds `bytes` split at `cuts`, notifying the stream after every piece.
pub fn deliver_in_pieces(bytes: &[u8], cuts: &[usize], perspective: Perspective) -> RecordingSession {
    let mut stream = empty_stream();
    let mut session = RecordingSession::new(perspective).with_debug_visitor();
    let mut bounds: Vec<usize> = cuts.iter().map(|cut| cut % (bytes.len() + 1)).collect();
    bounds.push(0);
    bounds.push(bytes.len());
    bounds.sort_unstable();
    bounds.dedup();
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        stream
            .sequencer_mut()
            .on_stream_frame(start as u64, &bytes[start..end], false)
            .expect("in-order data is accepted");
        let _ = stream.on_data_available(&mut session);
    }
    session
}
