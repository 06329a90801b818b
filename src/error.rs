//! Error types for decoding and aggregation.
//!
//! Decode-time failures never cross the stream boundary as `Err` values.
//! The decoder catches them, attaches them to the nearest frame as a
//! [`DecodeResult`](crate::frame::DecodeResult) failure, and moves the
//! stream into its absorbing bad-frame state. [`DecodeError`] is therefore
//! `Clone + PartialEq` so it can live inside frames and be asserted on.
//!
//! [`AggregateError`] is different: the aggregator operates on already
//! decoded frames, so its failures surface as ordinary `Result` errors.

use thiserror::Error;

/// Failures raised while turning bytes into frames.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A command or header line exceeded the configured maximum length.
    #[error("a STOMP line is longer than {limit} bytes")]
    LineTooLong {
        /// Configured maximum line length.
        limit: usize,
    },

    /// The command line did not name a known STOMP verb.
    #[error("cannot parse command: {line:?}")]
    UnknownCommand {
        /// The offending command line, after UTF-8 decoding.
        line: String,
    },

    /// A header line was malformed and header validation is enabled.
    #[error("received an invalid header line {line:?}")]
    MalformedHeaderLine {
        /// The offending line with any captured name restored.
        line: String,
    },

    /// A backslash introduced an escape sequence the protocol does not
    /// define, or was left unmatched at the end of a line.
    #[error("received an invalid escape header sequence {text:?}")]
    InvalidEscapeSequence {
        /// Accumulated text up to and including the bad escape.
        text: String,
    },

    /// The `content-length` header carried a negative value.
    #[error("content-length must be non-negative, got {value}")]
    NegativeContentLength {
        /// The parsed negative value.
        value: i64,
    },

    /// A byte other than NUL appeared where the frame terminator belongs.
    #[error("unexpected byte {byte:#04x} while expecting NUL frame terminator")]
    UnexpectedByte {
        /// The byte actually read.
        byte: u8,
    },
}

/// Failures raised while aggregating content chunks into a full frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The declared or accumulated content length exceeds the configured cap.
    #[error("frame content exceeds maximum length: {attempted} > {limit}")]
    FrameTooLarge {
        /// Length the message declared or would have reached.
        attempted: usize,
        /// Configured maximum aggregate content length.
        limit: usize,
    },

    /// A content frame arrived with no headers frame having opened a message.
    #[error("content frame received without a started message")]
    UnexpectedContent,
}
