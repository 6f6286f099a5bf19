use super::*;
use crate::error::FrameFamily;
use crate::frame::*;
use crate::session::Perspective;
use crate::testing::{RecordingSession, SessionCall};

fn settings_bytes(values: Vec<(u64, u64)>) -> Vec<u8> {
    let mut v = Vec::new();
    SettingsFrame::with_values(values).encode(&mut v);
    v
}

fn stream_with(bytes: &[u8]) -> ReceiveControlStream {
    crate::init_test_logging();
    let mut stream = ReceiveControlStream::new(PendingStream::new(3));
    stream.sequencer_mut().on_stream_frame(0, bytes, false).unwrap();
    stream
}

fn close_call(code: ErrorCode, detail: &str) -> SessionCall {
    SessionCall::Close {
        code,
        detail: detail.to_string(),
        behavior: ConnectionCloseBehavior::SendConnectionClosePacket,
    }
}

#[test]
fn stream_properties() {
    let stream = stream_with(&[]);
    assert_eq!(stream.id(), 3);
    assert!(stream.is_static());
    assert_eq!(stream.stream_type(), StreamType::ReadUnidirectional);
    assert!(!stream.settings_received());
    assert_eq!(stream.state(), ControlStreamState::AwaitingSettings);
    assert!(stream.sequencer().is_level_triggered());
}

#[test]
fn settings_then_max_push_id_on_server() {
    let mut bytes = settings_bytes(vec![(SETTINGS_QPACK_MAX_TABLE_CAPACITY, 4096)]);
    MaxPushIdFrame::new(5).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Server);

    assert_eq!(stream.on_data_available(&mut session), Ok(()));
    assert_eq!(
        session.calls(),
        &[
            SessionCall::Setting(SETTINGS_QPACK_MAX_TABLE_CAPACITY, 4096),
            SessionCall::MaxAllowedPushId(5),
        ]
    );
    assert!(stream.settings_received());
    assert_eq!(stream.state(), ControlStreamState::SettingsEstablished);
    assert_eq!(stream.sequencer().num_bytes_consumed(), bytes.len() as u64);
    assert!(stream.decoder().at_frame_boundary());
}

#[test]
fn goaway_on_client() {
    let mut bytes = settings_bytes(vec![]);
    GoAwayFrame::new(9).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    stream.on_data_available(&mut session).unwrap();
    assert_eq!(session.calls(), &[SessionCall::GoAway(9)]);
}

#[test]
fn data_frame_closes_connection() {
    let mut bytes = settings_bytes(vec![]);
    encode_data_frame(b"abc", &mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    let err = stream.on_data_available(&mut session).unwrap_err();
    assert_eq!(err, ControlStreamError::WrongFrame { family: FrameFamily::Data });
    assert_eq!(
        session.calls(),
        &[close_call(
            ErrorCode::HttpFrameUnexpectedOnControlStream,
            "Data frame received on control stream"
        )]
    );
    assert!(stream.reading_stopped());
    assert_eq!(stream.state(), ControlStreamState::ConnectionClosed);
}

#[test]
fn second_settings_closes_connection() {
    let mut bytes = settings_bytes(vec![(SETTINGS_MAX_HEADER_LIST_SIZE, 10)]);
    bytes.extend(settings_bytes(vec![(SETTINGS_MAX_HEADER_LIST_SIZE, 20)]));
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    assert_eq!(
        stream.on_data_available(&mut session),
        Err(ControlStreamError::DuplicateSettings)
    );
    assert_eq!(
        session.calls(),
        &[
            SessionCall::Setting(SETTINGS_MAX_HEADER_LIST_SIZE, 10),
            close_call(ErrorCode::HttpFrameUnexpected, "Settings frames are received twice."),
        ]
    );
}

#[test]
fn second_settings_in_a_later_delivery() {
    let first = settings_bytes(vec![]);
    let mut stream = stream_with(&first);
    let mut session = RecordingSession::new(Perspective::Server);
    stream.on_data_available(&mut session).unwrap();
    assert!(session.calls().is_empty());

    stream
        .sequencer_mut()
        .on_stream_frame(first.len() as u64, &first, false)
        .unwrap();
    assert!(stream.on_data_available(&mut session).is_err());
    assert_eq!(session.closes(), vec![(ErrorCode::HttpFrameUnexpected, "Settings frames are received twice.")]);
}

#[test]
fn debug_visitor_sees_settings_before_they_apply() {
    let bytes = settings_bytes(vec![(SETTINGS_QPACK_BLOCKED_STREAMS, 2), (0x21, 7)]);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client).with_debug_visitor();

    stream.on_data_available(&mut session).unwrap();
    assert_eq!(
        session.calls(),
        &[
            SessionCall::SettingsFrameReceived(SettingsFrame::with_values(vec![
                (SETTINGS_QPACK_BLOCKED_STREAMS, 2),
                (0x21, 7)
            ])),
            SessionCall::Setting(SETTINGS_QPACK_BLOCKED_STREAMS, 2),
            SessionCall::Setting(0x21, 7),
        ]
    );
}

#[test]
fn max_push_id_on_client_closes_connection() {
    let mut bytes = settings_bytes(vec![]);
    MaxPushIdFrame::new(1).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    assert!(stream.on_data_available(&mut session).is_err());
    assert_eq!(
        session.closes(),
        vec![(
            ErrorCode::HttpFrameUnexpectedOnControlStream,
            "Max Push Id frame received on control stream"
        )]
    );
}

#[test]
fn goaway_on_server_closes_connection() {
    let mut bytes = settings_bytes(vec![]);
    GoAwayFrame::new(4).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Server);

    assert!(stream.on_data_available(&mut session).is_err());
    assert_eq!(
        session.calls(),
        &[close_call(
            ErrorCode::HttpFrameUnexpectedOnControlStream,
            "Go Away frame received on control stream"
        )]
    );
}

#[test]
fn forbidden_frames() {
    let cases: Vec<(Vec<u8>, &str)> = vec![
        (
            {
                let mut v = Vec::new();
                encode_headers_frame(b"h", &mut v);
                v
            },
            "Headers frame received on control stream",
        ),
        (
            {
                let mut v = Vec::new();
                encode_push_promise_frame(1, b"p", &mut v);
                v
            },
            "Push Promise frame received on control stream",
        ),
        (
            {
                let mut v = Vec::new();
                CancelPushFrame::new(1).encode(&mut v);
                v
            },
            "Cancel Push frame received on control stream",
        ),
        (
            {
                let mut v = Vec::new();
                DuplicatePushFrame::new(1).encode(&mut v);
                v
            },
            "Duplicate Push frame received on control stream",
        ),
    ];
    for perspective in [Perspective::Client, Perspective::Server] {
        for (frame, detail) in &cases {
            let mut bytes = settings_bytes(vec![]);
            bytes.extend_from_slice(frame);
            let mut stream = stream_with(&bytes);
            let mut session = RecordingSession::new(perspective);
            assert!(stream.on_data_available(&mut session).is_err());
            assert_eq!(
                session.calls(),
                &[close_call(ErrorCode::HttpFrameUnexpectedOnControlStream, detail)],
                "{:?} {}",
                perspective,
                detail
            );
        }
    }
}

#[test]
fn frames_before_settings_are_judged_by_type() {
    let mut bytes = Vec::new();
    encode_unknown_frame(0x21, b"ignored", &mut bytes);
    GoAwayFrame::new(1).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    stream.on_data_available(&mut session).unwrap();
    assert_eq!(session.calls(), &[SessionCall::GoAway(1)]);
    assert!(!stream.settings_received());
}

#[test]
fn priority_update_and_unknown_frames_are_ignored() {
    let mut bytes = settings_bytes(vec![]);
    PriorityUpdateFrame::new(vec![0x00, 0x04, b'u', b'=', b'1']).encode(&mut bytes);
    encode_unknown_frame(0x2f, &[0; 40], &mut bytes);
    encode_unknown_frame(0x21, &[], &mut bytes);
    GoAwayFrame::new(0).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    stream.on_data_available(&mut session).unwrap();
    assert_eq!(session.calls(), &[SessionCall::GoAway(0)]);
}

#[test]
fn malformed_frame_closes_with_decoder_error() {
    let mut bytes = settings_bytes(vec![]);
    bytes.extend_from_slice(&[0x07, 0x02, 0x09, 0x00]);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);

    let err = stream.on_data_available(&mut session).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::HttpFrameError);
    assert_eq!(
        session.calls(),
        &[close_call(ErrorCode::HttpFrameError, "Superfluous data in GOAWAY frame.")]
    );
    assert_eq!(stream.decoder().error(), ErrorCode::HttpFrameError);
    assert_eq!(stream.state(), ControlStreamState::ConnectionClosed);
}

#[test]
fn nothing_is_read_after_a_violation() {
    let mut bytes = settings_bytes(vec![]);
    CancelPushFrame::new(0).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);
    assert!(stream.on_data_available(&mut session).is_err());
    let consumed = stream.sequencer().num_bytes_consumed();

    let mut more = Vec::new();
    GoAwayFrame::new(1).encode(&mut more);
    stream
        .sequencer_mut()
        .on_stream_frame(bytes.len() as u64, &more, false)
        .unwrap();
    assert_eq!(stream.on_data_available(&mut session), Ok(()));
    assert_eq!(session.closes().len(), 1);
    assert_eq!(session.calls().len(), 1);
    assert_eq!(stream.sequencer().num_bytes_consumed(), consumed);
}

#[test]
fn stops_when_session_disconnects() {
    let mut bytes = settings_bytes(vec![(SETTINGS_MAX_HEADER_LIST_SIZE, 1)]);
    GoAwayFrame::new(1).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    let mut session = RecordingSession::new(Perspective::Client);
    session.disconnect();

    assert_eq!(stream.on_data_available(&mut session), Ok(()));
    assert_eq!(session.calls(), &[SessionCall::Setting(SETTINGS_MAX_HEADER_LIST_SIZE, 1)]);
    assert!(stream.reading_stopped());
}

#[test]
fn partial_frames_wait_for_more_data() {
    let mut bytes = settings_bytes(vec![(SETTINGS_QPACK_MAX_TABLE_CAPACITY, 16384)]);
    GoAwayFrame::new(300).encode(&mut bytes);
    let split = bytes.len() - 1;
    let mut stream = stream_with(&bytes[..split]);
    let mut session = RecordingSession::new(Perspective::Client);

    stream.on_data_available(&mut session).unwrap();
    assert_eq!(
        session.calls(),
        &[SessionCall::Setting(SETTINGS_QPACK_MAX_TABLE_CAPACITY, 16384)]
    );
    assert_eq!(stream.sequencer().readable_bytes(), 0);
    assert!(!stream.decoder().at_frame_boundary());

    stream
        .sequencer_mut()
        .on_stream_frame(split as u64, &bytes[split..], false)
        .unwrap();
    stream.on_data_available(&mut session).unwrap();
    assert_eq!(session.calls()[1], SessionCall::GoAway(300));
}

#[test]
fn reset_is_fatal() {
    let mut stream = stream_with(&settings_bytes(vec![]));
    let mut session = RecordingSession::new(Perspective::Server);
    stream.on_data_available(&mut session).unwrap();

    stream.on_stream_reset(&RstStreamFrame::new(3, 0x10c, 2), &mut session);
    assert_eq!(
        session.calls(),
        &[close_call(
            ErrorCode::HttpClosedCriticalStream,
            "Attempt to reset receive control stream"
        )]
    );
    assert!(stream.reading_stopped());
}

#[test]
fn reset_before_any_data() {
    let mut stream = stream_with(&[]);
    let mut session = RecordingSession::new(Perspective::Client);
    stream.on_stream_reset(&RstStreamFrame::new(3, 0, 0), &mut session);
    assert_eq!(session.closes(), vec![(ErrorCode::HttpClosedCriticalStream, "Attempt to reset receive control stream")]);
}

#[test]
fn stop_reading_leaves_data_buffered() {
    let bytes = settings_bytes(vec![]);
    let mut stream = stream_with(&bytes);
    stream.stop_reading();
    let mut session = RecordingSession::new(Perspective::Client);
    stream.on_data_available(&mut session).unwrap();
    assert_eq!(stream.sequencer().readable_bytes(), bytes.len());
    assert!(!stream.settings_received());
}

#[test]
fn custom_decoder_limit() {
    let bytes = settings_bytes(vec![(SETTINGS_QPACK_MAX_TABLE_CAPACITY, 1), (SETTINGS_MAX_HEADER_LIST_SIZE, 2)]);
    let mut pending = PendingStream::new(7);
    pending.sequencer_mut().on_stream_frame(0, &bytes, false).unwrap();
    let options = HttpDecoderOptions::new().with_max_buffered_payload(3);
    let mut stream = ReceiveControlStream::with_options(pending, options);
    let mut session = RecordingSession::new(Perspective::Client);

    let err = stream.on_data_available(&mut session).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::HttpFrameTooLarge);
    assert_eq!(session.closes(), vec![(ErrorCode::HttpFrameTooLarge, "Frame is too large.")]);
    assert_eq!(stream.decoder().options(), options);
}

#[test]
fn decoder_stopping_short_without_error_is_internal() {
    let mut bytes = settings_bytes(vec![]);
    encode_unknown_frame(0x21, b"x", &mut bytes);
    GoAwayFrame::new(1).encode(&mut bytes);
    let mut stream = stream_with(&bytes);
    stream.pause_on_unknown = true;
    let mut session = RecordingSession::new(Perspective::Client);

    let detail = "Control stream decoder consumed 4 of 8 bytes without an error";
    assert_eq!(
        stream.on_data_available(&mut session),
        Err(ControlStreamError::Internal {
            detail: detail.to_string()
        })
    );
    assert_eq!(session.calls(), &[close_call(ErrorCode::InternalError, detail)]);
    assert!(stream.decoder().error().is_ok());
    assert!(stream.reading_stopped());
    assert_eq!(stream.state(), ControlStreamState::ConnectionClosed);
    assert_eq!(stream.sequencer().num_bytes_consumed(), 4);

    assert_eq!(stream.on_data_available(&mut session), Ok(()));
    assert_eq!(session.calls().len(), 1);
}
