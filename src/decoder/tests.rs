//! Unit tests for the frame decoder state machine.

use bytes::BytesMut;
use rstest::rstest;
use tokio_util::codec::Decoder;

use super::StompDecoder;
use crate::{
    error::DecodeError,
    frame::{Command, StompFrame, headers},
};

const CONNECT_FRAME: &str = "CONNECT\nhost:stomp.github.org\naccept-version:1.1,1.2\n\n\0";

const CONNECTED_FRAME: &str = "CONNECTED\nversion:1.2\n\n\0";

const SEND_FRAME_WITH_CONTENT_LENGTH: &str = "SEND\ndestination:/queue/a\ncontent-type:text/plain\ncontent-length:17\n\nhello, queue a!!!\0";

const SEND_FRAME_WITHOUT_CONTENT_LENGTH: &str =
    "SEND\ndestination:/queue/a\ncontent-type:text/plain\n\nhello, queue a!\0";

const FRAME_WITH_INVALID_HEADER: &str = "SEND\ndestination:/some-destination\ncurrent-time:2000-01-01T00:00:00\ncontent-type:text/plain\n\nsome body\0";

const FRAME_WITH_EMPTY_HEADER_NAME: &str =
    "SEND\ndestination:/some-destination\n:header-value\ncontent-type:text/plain\n\nsome body\0";

const SEND_FRAME_UTF8: &str =
    "SEND\ndestination:/queue/№11±♛нетти♕\ncontent-type:text/plain\n\nbody\0";

/// Drain every frame the decoder will produce for `input`.
fn decode_all(decoder: &mut StompDecoder, input: &[u8]) -> Vec<StompFrame> {
    let mut src = BytesMut::from(input);
    let mut frames = Vec::new();
    while let Some(frame) = decoder.decode(&mut src).expect("decode never errors") {
        frames.push(frame);
    }
    frames
}

fn expect_headers(frame: &StompFrame) -> &crate::frame::HeadersFrame {
    match frame {
        StompFrame::Headers(headers) => headers,
        other => panic!("expected a headers frame, got {other:?}"),
    }
}

fn expect_content(frame: &StompFrame) -> &crate::frame::ContentFrame {
    match frame {
        StompFrame::Content(content) => content,
        other => panic!("expected a content frame, got {other:?}"),
    }
}

fn expect_last_content(frame: &StompFrame) -> &crate::frame::ContentFrame {
    match frame {
        StompFrame::LastContent(content) => content,
        other => panic!("expected a last content frame, got {other:?}"),
    }
}

#[test]
fn decodes_a_bodiless_frame_as_headers_plus_empty_terminator() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, CONNECT_FRAME.as_bytes());

    assert_eq!(frames.len(), 2);
    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.command(), Command::Connect);
    assert_eq!(headers_frame.headers().get(headers::HOST), Some("stomp.github.org"));
    assert!(headers_frame.decode_result().is_success());

    let last = expect_last_content(&frames[1]);
    assert!(last.payload().is_empty());
    assert!(last.decode_result().is_success());
}

#[test]
fn decodes_a_frame_with_a_content_length_header() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, SEND_FRAME_WITH_CONTENT_LENGTH.as_bytes());

    assert_eq!(frames.len(), 2);
    assert_eq!(expect_headers(&frames[0]).command(), Command::Send);
    assert_eq!(
        expect_last_content(&frames[1]).payload().as_ref(),
        b"hello, queue a!!!"
    );
}

#[test]
fn decodes_a_nul_delimited_body() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, SEND_FRAME_WITHOUT_CONTENT_LENGTH.as_bytes());

    assert_eq!(frames.len(), 2);
    assert_eq!(
        expect_last_content(&frames[1]).payload().as_ref(),
        b"hello, queue a!"
    );
}

#[test]
fn splits_a_declared_body_into_bounded_chunks() {
    let mut decoder = StompDecoder::with_config(10_000, 5, false);
    let frames = decode_all(&mut decoder, SEND_FRAME_WITH_CONTENT_LENGTH.as_bytes());

    assert_eq!(frames.len(), 5);
    assert_eq!(expect_headers(&frames[0]).command(), Command::Send);
    assert_eq!(expect_content(&frames[1]).payload().as_ref(), b"hello");
    assert_eq!(expect_content(&frames[2]).payload().as_ref(), b", que");
    assert_eq!(expect_content(&frames[3]).payload().as_ref(), b"ue a!");
    assert_eq!(expect_last_content(&frames[4]).payload().as_ref(), b"!!");
}

#[test]
fn bounds_nul_delimited_bodies_by_chunk_size_too() {
    let mut decoder = StompDecoder::with_config(10_000, 5, false);
    let frames = decode_all(&mut decoder, SEND_FRAME_WITHOUT_CONTENT_LENGTH.as_bytes());

    assert_eq!(frames.len(), 4);
    assert_eq!(expect_content(&frames[1]).payload().as_ref(), b"hello");
    assert_eq!(expect_content(&frames[2]).payload().as_ref(), b", que");
    assert_eq!(expect_last_content(&frames[3]).payload().as_ref(), b"ue a!");
}

#[test]
fn decodes_back_to_back_frames_from_one_buffer() {
    let mut decoder = StompDecoder::new();
    let mut input = CONNECT_FRAME.as_bytes().to_vec();
    input.extend_from_slice(CONNECTED_FRAME.as_bytes());
    let frames = decode_all(&mut decoder, &input);

    assert_eq!(frames.len(), 4);
    assert_eq!(expect_headers(&frames[0]).command(), Command::Connect);
    assert!(expect_last_content(&frames[1]).payload().is_empty());
    assert_eq!(expect_headers(&frames[2]).command(), Command::Connected);
    assert!(expect_last_content(&frames[3]).payload().is_empty());
}

#[test]
fn skips_heartbeat_lines_between_frames() {
    let mut decoder = StompDecoder::new();
    let mut input = b"\r\n\n\r\n".to_vec();
    input.extend_from_slice(CONNECT_FRAME.as_bytes());
    let frames = decode_all(&mut decoder, &input);

    assert_eq!(frames.len(), 2);
    assert_eq!(expect_headers(&frames[0]).command(), Command::Connect);
}

#[test]
fn skips_invalid_headers_when_validation_is_off() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, FRAME_WITH_INVALID_HEADER.as_bytes());

    assert_eq!(frames.len(), 2);
    let headers_frame = expect_headers(&frames[0]);
    assert!(headers_frame.decode_result().is_success());
    let entries: Vec<_> = headers_frame.headers().iter().collect();
    assert_eq!(
        entries,
        vec![
            ("destination", "/some-destination"),
            ("content-type", "text/plain"),
        ]
    );
    assert_eq!(expect_last_content(&frames[1]).payload().as_ref(), b"some body");
}

#[test]
fn fails_the_frame_on_invalid_headers_when_validating() {
    let mut decoder = StompDecoder::with_config(1024, 8132, true);
    let frames = decode_all(&mut decoder, FRAME_WITH_INVALID_HEADER.as_bytes());

    assert_eq!(frames.len(), 1, "bad frame state drops the remaining bytes");
    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.command(), Command::Send);
    assert_eq!(
        headers_frame.decode_result().cause(),
        Some(&DecodeError::MalformedHeaderLine {
            line: "current-time:2000-01-01T00:00:00".to_owned()
        })
    );
}

#[test]
fn fails_the_frame_on_empty_header_names_when_validating() {
    let mut decoder = StompDecoder::with_config(1024, 8132, true);
    let frames = decode_all(&mut decoder, FRAME_WITH_EMPTY_HEADER_NAME.as_bytes());

    assert_eq!(frames.len(), 1);
    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(
        headers_frame.decode_result().cause(),
        Some(&DecodeError::MalformedHeaderLine {
            line: ":header-value".to_owned()
        })
    );
}

#[test]
fn decodes_utf8_header_values() {
    let mut decoder = StompDecoder::with_config(1024, 8132, true);
    let frames = decode_all(&mut decoder, SEND_FRAME_UTF8.as_bytes());

    assert_eq!(frames.len(), 2);
    let headers_frame = expect_headers(&frames[0]);
    assert!(headers_frame.decode_result().is_success());
    assert_eq!(
        headers_frame.headers().get(headers::DESTINATION),
        Some("/queue/№11±♛нетти♕")
    );
    assert_eq!(expect_last_content(&frames[1]).payload().as_ref(), b"body");
}

#[test]
fn keeps_raw_colons_in_connect_header_values() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"CONNECT\nlogin:user:secret\n\n\0");

    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.headers().get(headers::LOGIN), Some("user:secret"));
}

#[test]
fn resolves_escapes_outside_the_connect_family() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"SEND\nkey:a\\cb\\\\c\\nd\n\n\0");

    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.headers().get("key"), Some("a:b\\c\nd"));
}

#[test]
fn rejects_unknown_commands_with_a_failed_headers_frame() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"INVALID\n\n\0");

    assert_eq!(frames.len(), 1);
    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.command(), Command::Unknown);
    assert_eq!(
        headers_frame.decode_result().cause(),
        Some(&DecodeError::UnknownCommand {
            line: "INVALID".to_owned()
        })
    );
}

#[test]
fn rejects_negative_content_lengths() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"SEND\ncontent-length:-1\n\nabc\0");

    assert_eq!(frames.len(), 1);
    let headers_frame = expect_headers(&frames[0]);
    assert_eq!(headers_frame.command(), Command::Send);
    assert_eq!(
        headers_frame.decode_result().cause(),
        Some(&DecodeError::NegativeContentLength { value: -1 })
    );
}

#[test]
fn treats_an_unparseable_content_length_as_zero() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"SEND\ncontent-length:five\n\n\0");

    assert_eq!(frames.len(), 2);
    assert!(expect_headers(&frames[0]).decode_result().is_success());
    assert!(expect_last_content(&frames[1]).payload().is_empty());
}

#[test]
fn a_zero_content_length_skips_content_reading() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"SEND\ndestination:/queue/a\ncontent-length:0\n\n\0");

    assert_eq!(frames.len(), 2);
    assert!(expect_last_content(&frames[1]).payload().is_empty());
}

#[test]
fn fails_on_a_missing_nul_terminator() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"SEND\ncontent-length:4\n\nbodyX\0");

    assert_eq!(frames.len(), 2);
    assert!(expect_headers(&frames[0]).decode_result().is_success());
    let last = expect_last_content(&frames[1]);
    assert!(last.payload().is_empty(), "the partial chunk is released");
    assert_eq!(
        last.decode_result().cause(),
        Some(&DecodeError::UnexpectedByte { byte: b'X' })
    );
}

#[test]
fn fails_on_over_long_command_lines() {
    let mut decoder = StompDecoder::with_config(8, 8132, false);
    let frames = decode_all(&mut decoder, b"SUBSCRIBE-BUT-FAR-TOO-LONG\n\n\0");

    assert_eq!(frames.len(), 1);
    assert_eq!(
        expect_headers(&frames[0]).decode_result().cause(),
        Some(&DecodeError::LineTooLong { limit: 8 })
    );
}

#[test]
fn stays_in_the_bad_frame_state_until_discarded() {
    let mut decoder = StompDecoder::new();
    let frames = decode_all(&mut decoder, b"INVALID\n\n\0");
    assert_eq!(frames.len(), 1);

    // A perfectly valid frame afterwards is still dropped.
    let frames = decode_all(&mut decoder, CONNECT_FRAME.as_bytes());
    assert!(frames.is_empty());

    // A fresh decoder accepts it.
    let mut fresh = StompDecoder::new();
    let frames = decode_all(&mut fresh, CONNECT_FRAME.as_bytes());
    assert_eq!(frames.len(), 2);
}

/// Fold a frame sequence into logical messages so runs with different chunk
/// boundaries compare equal: (headers frame, concatenated body, terminal
/// decode result).
fn messages(frames: &[StompFrame]) -> Vec<(crate::frame::HeadersFrame, Vec<u8>, bool)> {
    let mut collected = Vec::new();
    let mut current: Option<(crate::frame::HeadersFrame, Vec<u8>)> = None;
    for frame in frames {
        match frame {
            StompFrame::Headers(headers) => current = Some((headers.clone(), Vec::new())),
            StompFrame::Content(content) => {
                let (_, body) = current.as_mut().expect("content after headers");
                body.extend_from_slice(content.payload());
            }
            StompFrame::LastContent(content) => {
                let (headers, mut body) = current.take().expect("terminator after headers");
                body.extend_from_slice(content.payload());
                collected.push((headers, body, content.decode_result().is_success()));
            }
            StompFrame::Full(full) => panic!("decoder never emits full frames: {full:?}"),
        }
    }
    collected
}

#[rstest]
#[case::declared_length(SEND_FRAME_WITH_CONTENT_LENGTH)]
#[case::nul_delimited(SEND_FRAME_WITHOUT_CONTENT_LENGTH)]
#[case::utf8_headers(SEND_FRAME_UTF8)]
fn resumes_across_arbitrary_split_points(#[case] fixture: &str) {
    let input = fixture.as_bytes();
    let mut reference = StompDecoder::new();
    let expected = messages(&decode_all(&mut reference, input));

    for split in 1..input.len() {
        let mut decoder = StompDecoder::new();
        let mut frames = decode_all(&mut decoder, &input[..split]);
        frames.extend(decode_all(&mut decoder, &input[split..]));
        assert_eq!(messages(&frames), expected, "split at byte {split}");
    }
}

#[test]
fn byte_at_a_time_feeding_yields_the_same_messages() {
    let input = SEND_FRAME_WITHOUT_CONTENT_LENGTH.as_bytes();
    let mut reference = StompDecoder::new();
    let expected = messages(&decode_all(&mut reference, input));

    let mut decoder = StompDecoder::new();
    let mut src = BytesMut::new();
    let mut frames = Vec::new();
    for &byte in input {
        src.extend_from_slice(&[byte]);
        while let Some(frame) = decoder.decode(&mut src).expect("decode never errors") {
            frames.push(frame);
        }
    }
    assert_eq!(messages(&frames), expected);
}
