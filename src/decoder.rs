//! The STOMP frame decoder state machine.
//!
//! [`StompDecoder`] turns an arbitrarily fragmented byte stream into
//! [`StompFrame`]s: one [`HeadersFrame`] per message, zero or more content
//! chunks bounded by the configured maximum chunk size, and exactly one
//! terminal last-content chunk even for bodiless messages. `decode` emits at
//! most one frame per call and is re-invoked until it returns `Ok(None)`,
//! which is how `tokio_util`'s `FramedRead` already drives it.
//!
//! Decode failures do not surface as `Err`: they are attached to the nearest
//! frame as a [`DecodeResult`] failure so downstream consumers always observe
//! something for every attempted message, and the decoder then moves to an
//! absorbing bad-frame state that drops all further input until the instance
//! is discarded. There is no resynchronisation within one stream.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::{
    error::DecodeError,
    frame::{Command, ContentFrame, DecodeResult, HeadersFrame, StompFrame, StompHeaders},
    tokenizer::{CR, HeaderEvent, HeaderTokenizer, LF, LineTokenizer, NUL},
};

/// Default cap on the length of a command or header line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Default cap on the size of an emitted content chunk.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 8132;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    SkipControlChars,
    ReadHeaders,
    ReadContent,
    FinalizeFrame,
    BadFrame,
}

enum ContentStep {
    Suspend,
    Chunk(ContentFrame),
    Finalize,
}

/// Streaming decoder for one STOMP byte stream.
///
/// One instance serves exactly one logical stream; state is per-stream and
/// must not be shared. Aborting mid-stream means dropping the instance.
#[derive(Debug)]
pub struct StompDecoder {
    state: State,
    command_tokenizer: LineTokenizer,
    header_tokenizer: HeaderTokenizer,
    max_chunk_size: usize,
    headers_frame: Option<HeadersFrame>,
    content_length: Option<u64>,
    read_chunk_size: u64,
    last_content: Option<ContentFrame>,
}

impl StompDecoder {
    /// Decoder with default limits and header validation off.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_CHUNK_SIZE, false)
    }

    /// Decoder with explicit line and chunk limits.
    ///
    /// With `validate_headers` off, malformed header lines are skipped;
    /// with it on they fail the frame.
    #[must_use]
    pub fn with_config(
        max_line_length: usize,
        max_chunk_size: usize,
        validate_headers: bool,
    ) -> Self {
        Self {
            state: State::SkipControlChars,
            command_tokenizer: LineTokenizer::new(max_line_length),
            header_tokenizer: HeaderTokenizer::new(max_line_length, validate_headers),
            max_chunk_size,
            headers_frame: None,
            content_length: None,
            read_chunk_size: 0,
            last_content: None,
        }
    }

    fn read_headers(&mut self, src: &mut BytesMut) -> Result<Option<HeadersFrame>, DecodeError> {
        let mut frame = match self.headers_frame.take() {
            Some(frame) => frame,
            None => {
                let Some(line) = self.command_tokenizer.next_line(src)? else {
                    return Ok(None);
                };
                let Some(command) = Command::from_name(&line) else {
                    return Err(DecodeError::UnknownCommand { line });
                };
                trace!(%command, "decoded command line");
                self.header_tokenizer.set_unescape(command.escapes_headers());
                HeadersFrame::new(command)
            }
        };

        loop {
            match self.header_tokenizer.next_header(src) {
                Ok(None) => {
                    self.headers_frame = Some(frame);
                    return Ok(None);
                }
                Ok(Some(HeaderEvent::Entry(name, value))) => frame.headers_mut().add(name, value),
                Ok(Some(HeaderEvent::End)) => break,
                Err(err) => {
                    self.headers_frame = Some(frame);
                    return Err(err);
                }
            }
        }

        let length = match content_length(frame.headers()) {
            Ok(length) => length,
            Err(err) => {
                self.headers_frame = Some(frame);
                return Err(err);
            }
        };
        self.content_length = length;
        self.state = if length == Some(0) {
            State::FinalizeFrame
        } else {
            State::ReadContent
        };
        Ok(Some(frame))
    }

    fn read_body(&mut self, src: &mut BytesMut) -> Result<Option<StompFrame>, DecodeError> {
        if self.state == State::ReadContent {
            match self.read_content(src)? {
                ContentStep::Suspend => return Ok(None),
                ContentStep::Chunk(chunk) => return Ok(Some(StompFrame::Content(chunk))),
                ContentStep::Finalize => {}
            }
        }

        // FinalizeFrame: exactly one NUL closes the frame.
        if !src.has_remaining() {
            return Ok(None);
        }
        let byte = src.get_u8();
        if byte != NUL {
            return Err(DecodeError::UnexpectedByte { byte });
        }
        let last = self.last_content.take().unwrap_or_else(ContentFrame::empty);
        self.reset();
        Ok(Some(StompFrame::LastContent(last)))
    }

    fn read_content(&mut self, src: &mut BytesMut) -> Result<ContentStep, DecodeError> {
        if !src.has_remaining() {
            return Ok(ContentStep::Suspend);
        }

        if let Some(length) = self.content_length {
            let remaining = usize::try_from(length.saturating_sub(self.read_chunk_size))
                .unwrap_or(usize::MAX);
            let to_read = src.remaining().min(self.max_chunk_size).min(remaining);
            let chunk = src.split_to(to_read).freeze();
            self.read_chunk_size += to_read as u64;
            if self.read_chunk_size >= length {
                self.last_content = Some(ContentFrame::new(chunk));
                self.state = State::FinalizeFrame;
                Ok(ContentStep::Finalize)
            } else {
                Ok(ContentStep::Chunk(ContentFrame::new(chunk)))
            }
        } else {
            match src.iter().position(|&byte| byte == NUL) {
                Some(0) => {
                    self.state = State::FinalizeFrame;
                    Ok(ContentStep::Finalize)
                }
                Some(before_nul) if before_nul <= self.max_chunk_size => {
                    let chunk = src.split_to(before_nul).freeze();
                    self.read_chunk_size += before_nul as u64;
                    self.last_content = Some(ContentFrame::new(chunk));
                    self.state = State::FinalizeFrame;
                    Ok(ContentStep::Finalize)
                }
                _ => {
                    let to_read = src.remaining().min(self.max_chunk_size);
                    let chunk = src.split_to(to_read).freeze();
                    self.read_chunk_size += to_read as u64;
                    Ok(ContentStep::Chunk(ContentFrame::new(chunk)))
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::SkipControlChars;
        self.headers_frame = None;
        self.content_length = None;
        self.read_chunk_size = 0;
        self.last_content = None;
    }
}

impl Default for StompDecoder {
    fn default() -> Self { Self::new() }
}

impl Decoder for StompDecoder {
    type Item = StompFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<StompFrame>, io::Error> {
        if self.state == State::BadFrame {
            src.clear();
            return Ok(None);
        }

        if self.state == State::SkipControlChars {
            if !skip_control_characters(src) {
                return Ok(None);
            }
            self.state = State::ReadHeaders;
        }

        if self.state == State::ReadHeaders {
            return match self.read_headers(src) {
                Ok(None) => Ok(None),
                Ok(Some(frame)) => Ok(Some(StompFrame::Headers(frame))),
                Err(err) => {
                    warn!(%err, "header decode failed, dropping the rest of the stream");
                    let mut frame = self
                        .headers_frame
                        .take()
                        .unwrap_or_else(|| HeadersFrame::new(Command::Unknown));
                    frame.set_decode_result(DecodeResult::Failure(err));
                    self.state = State::BadFrame;
                    Ok(Some(StompFrame::Headers(frame)))
                }
            };
        }

        match self.read_body(src) {
            Ok(frame) => Ok(frame),
            Err(err) => {
                warn!(%err, "content decode failed, dropping the rest of the stream");
                // Any partially built terminal chunk is released here.
                self.last_content = None;
                let mut frame = ContentFrame::empty();
                frame.set_decode_result(DecodeResult::Failure(err));
                self.state = State::BadFrame;
                Ok(Some(StompFrame::LastContent(frame)))
            }
        }
    }
}

/// First `content-length` value interpreted per the protocol: unparseable
/// reads as zero, negative is a decode failure.
fn content_length(headers: &StompHeaders) -> Result<Option<u64>, DecodeError> {
    let Some(raw) = headers.content_length() else {
        return Ok(None);
    };
    let value = raw.parse::<i64>().unwrap_or(0);
    match u64::try_from(value) {
        Ok(length) => Ok(Some(length)),
        Err(_) => Err(DecodeError::NegativeContentLength { value }),
    }
}

/// Discard the CR/LF run preceding a command line; false when the buffer is
/// exhausted without reaching one.
fn skip_control_characters(src: &mut BytesMut) -> bool {
    while let Some(&byte) = src.first() {
        if byte == CR || byte == LF {
            src.advance(1);
        } else {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests;
