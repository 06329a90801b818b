//! The STOMP frame model.
//!
//! A logical STOMP message decodes as a [`HeadersFrame`] followed by zero or
//! more [`ContentFrame`] chunks and exactly one terminal last-content chunk,
//! even when the body is empty. The [`StompAggregator`](crate::StompAggregator)
//! folds that sequence back into a [`FullFrame`]. All four kinds carry a
//! [`DecodeResult`] recording whether decoding succeeded; consumers must
//! check it before trusting a frame's contents.
//!
//! Payload bytes are held as [`Bytes`]: each frame exclusively owns its
//! payload until it is moved out with `into_payload`, and `Bytes::clone` is
//! the explicit operation for callers that need an independent handle.

pub mod command;
pub mod headers;

use bytes::Bytes;

pub use command::Command;
pub use headers::StompHeaders;

use crate::error::DecodeError;

/// Outcome attached to every decoded frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DecodeResult {
    /// The frame decoded cleanly.
    #[default]
    Success,
    /// Decoding failed; the frame's other fields are best-effort.
    Failure(DecodeError),
}

impl DecodeResult {
    /// Whether the frame decoded cleanly.
    #[must_use]
    pub const fn is_success(&self) -> bool { matches!(self, Self::Success) }

    /// Whether decoding failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool { matches!(self, Self::Failure(_)) }

    /// The captured failure cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&DecodeError> {
        match self {
            Self::Success => None,
            Self::Failure(cause) => Some(cause),
        }
    }
}

/// Command and headers of a message, emitted before any of its content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadersFrame {
    command: Command,
    headers: StompHeaders,
    result: DecodeResult,
}

impl HeadersFrame {
    /// Create a headers frame with an empty header map.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: StompHeaders::new(),
            result: DecodeResult::Success,
        }
    }

    /// Create a headers frame with the given headers.
    #[must_use]
    pub fn with_headers(command: Command, headers: StompHeaders) -> Self {
        Self {
            command,
            headers,
            result: DecodeResult::Success,
        }
    }

    /// The frame's command verb.
    #[must_use]
    pub const fn command(&self) -> Command { self.command }

    /// Borrow the header map.
    #[must_use]
    pub const fn headers(&self) -> &StompHeaders { &self.headers }

    /// Mutably borrow the header map.
    pub const fn headers_mut(&mut self) -> &mut StompHeaders { &mut self.headers }

    /// The decode outcome for this frame.
    #[must_use]
    pub const fn decode_result(&self) -> &DecodeResult { &self.result }

    /// Record a decode outcome.
    pub fn set_decode_result(&mut self, result: DecodeResult) { self.result = result; }

    /// Split the frame into its parts, consuming it.
    #[must_use]
    pub fn into_parts(self) -> (Command, StompHeaders, DecodeResult) {
        (self.command, self.headers, self.result)
    }
}

/// One chunk of a message body.
///
/// The same type backs both intermediate and terminal chunks; which one a
/// given value is follows from its position in [`StompFrame`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentFrame {
    payload: Bytes,
    result: DecodeResult,
}

impl ContentFrame {
    /// Create a content chunk owning `payload`.
    #[must_use]
    pub fn new(payload: Bytes) -> Self {
        Self {
            payload,
            result: DecodeResult::Success,
        }
    }

    /// An empty chunk, used as the synthesized terminator for bodiless
    /// messages.
    #[must_use]
    pub fn empty() -> Self { Self::new(Bytes::new()) }

    /// Borrow the chunk's payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Release the payload, consuming the frame.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// The decode outcome for this chunk.
    #[must_use]
    pub const fn decode_result(&self) -> &DecodeResult { &self.result }

    /// Record a decode outcome.
    pub fn set_decode_result(&mut self, result: DecodeResult) { self.result = result; }
}

/// A complete message: command, headers, and the whole payload.
///
/// Produced by the aggregator, or constructed directly by callers feeding
/// the encoder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FullFrame {
    command: Command,
    headers: StompHeaders,
    payload: Bytes,
    result: DecodeResult,
}

impl FullFrame {
    /// Create a full frame with no headers and an empty payload.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self::with_payload(command, StompHeaders::new(), Bytes::new())
    }

    /// Create a full frame from its parts.
    #[must_use]
    pub fn with_payload(command: Command, headers: StompHeaders, payload: Bytes) -> Self {
        Self {
            command,
            headers,
            payload,
            result: DecodeResult::Success,
        }
    }

    /// The frame's command verb.
    #[must_use]
    pub const fn command(&self) -> Command { self.command }

    /// Borrow the header map.
    #[must_use]
    pub const fn headers(&self) -> &StompHeaders { &self.headers }

    /// Mutably borrow the header map.
    pub const fn headers_mut(&mut self) -> &mut StompHeaders { &mut self.headers }

    /// Borrow the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Release the payload, consuming the frame.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// The decode outcome for this frame.
    #[must_use]
    pub const fn decode_result(&self) -> &DecodeResult { &self.result }

    /// Record a decode outcome.
    pub fn set_decode_result(&mut self, result: DecodeResult) { self.result = result; }
}

/// Any frame the codec produces or consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StompFrame {
    /// Command and headers, decoded first for every message.
    Headers(HeadersFrame),
    /// A body chunk with more chunks to follow.
    Content(ContentFrame),
    /// The final body chunk of a message, possibly empty.
    LastContent(ContentFrame),
    /// A complete message.
    Full(FullFrame),
}

impl StompFrame {
    /// The decode outcome for whichever variant this is.
    #[must_use]
    pub const fn decode_result(&self) -> &DecodeResult {
        match self {
            Self::Headers(frame) => frame.decode_result(),
            Self::Content(frame) | Self::LastContent(frame) => frame.decode_result(),
            Self::Full(frame) => frame.decode_result(),
        }
    }
}

impl From<HeadersFrame> for StompFrame {
    fn from(frame: HeadersFrame) -> Self { Self::Headers(frame) }
}

impl From<FullFrame> for StompFrame {
    fn from(frame: FullFrame) -> Self { Self::Full(frame) }
}
