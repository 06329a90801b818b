//! Reassembly of decoded frame streams into full frames.
//!
//! [`StompAggregator`] consumes the decoder's output in order and emits one
//! [`FullFrame`] per logical message. The configured maximum content length
//! is enforced eagerly: a message whose declared `content-length` already
//! exceeds it is rejected on its headers frame, and an accumulating message
//! fails before the chunk that would cross the limit is accepted.

use bytes::BytesMut;
use tracing::warn;

use crate::{
    error::AggregateError,
    frame::{Command, DecodeResult, FullFrame, StompFrame, StompHeaders},
};

#[derive(Debug)]
struct PartialFrame {
    command: Command,
    headers: StompHeaders,
    payload: BytesMut,
    result: DecodeResult,
}

impl PartialFrame {
    fn complete(self) -> FullFrame {
        let mut frame =
            FullFrame::with_payload(self.command, self.headers, self.payload.freeze());
        frame.set_decode_result(self.result);
        frame
    }
}

/// Folds a headers frame and its content chunks into one [`FullFrame`].
///
/// Like the decoder, an instance serves a single logical stream, driven
/// serially. After a message is rejected as too large, its remaining content
/// frames are discarded; the next headers frame starts fresh.
#[derive(Debug)]
pub struct StompAggregator {
    max_content_length: usize,
    current: Option<PartialFrame>,
    discarding: bool,
}

impl StompAggregator {
    /// Aggregator enforcing `max_content_length` on each message's payload.
    #[must_use]
    pub fn new(max_content_length: usize) -> Self {
        Self {
            max_content_length,
            current: None,
            discarding: false,
        }
    }

    /// Feed the next decoded frame.
    ///
    /// Returns `Ok(Some(_))` when a message is complete, `Ok(None)` while
    /// more frames are expected. A [`StompFrame::Full`] input passes through
    /// unchanged. A decode failure on the headers frame (and on the terminal
    /// content frame) is carried onto the emitted full frame rather than
    /// lost.
    ///
    /// # Errors
    ///
    /// [`AggregateError::FrameTooLarge`] when the declared or accumulated
    /// content exceeds the configured maximum, raised before the offending
    /// bytes are accepted; [`AggregateError::UnexpectedContent`] when a
    /// content frame arrives with no message in progress.
    pub fn push(&mut self, frame: StompFrame) -> Result<Option<FullFrame>, AggregateError> {
        match frame {
            StompFrame::Full(full) => Ok(Some(full)),
            StompFrame::Headers(headers) => {
                self.discarding = false;
                self.current = None;

                if let Some(declared) = declared_content_length(headers.headers()) {
                    if declared > self.max_content_length {
                        warn!(
                            declared,
                            limit = self.max_content_length,
                            "rejecting oversized frame before reading its content"
                        );
                        self.discarding = true;
                        return Err(AggregateError::FrameTooLarge {
                            attempted: declared,
                            limit: self.max_content_length,
                        });
                    }
                }

                let (command, headers, result) = headers.into_parts();
                self.current = Some(PartialFrame {
                    command,
                    headers,
                    payload: BytesMut::new(),
                    result,
                });
                Ok(None)
            }
            StompFrame::Content(chunk) => {
                if self.discarding {
                    return Ok(None);
                }
                let Some(mut current) = self.current.take() else {
                    return Err(AggregateError::UnexpectedContent);
                };
                if let Err(err) =
                    Self::check_limit(self.max_content_length, &current, chunk.payload().len())
                {
                    // The in-progress aggregate is released here.
                    self.discarding = true;
                    return Err(err);
                }
                current.payload.extend_from_slice(chunk.payload());
                self.current = Some(current);
                Ok(None)
            }
            StompFrame::LastContent(chunk) => {
                if self.discarding {
                    self.discarding = false;
                    return Ok(None);
                }
                let Some(mut current) = self.current.take() else {
                    return Err(AggregateError::UnexpectedContent);
                };
                Self::check_limit(self.max_content_length, &current, chunk.payload().len())?;
                if chunk.decode_result().is_failure() && current.result.is_success() {
                    current.result = chunk.decode_result().clone();
                }
                current.payload.extend_from_slice(chunk.payload());
                Ok(Some(current.complete()))
            }
        }
    }

    /// Whether a message is currently being assembled.
    #[must_use]
    pub const fn in_progress(&self) -> bool { self.current.is_some() }

    fn check_limit(
        limit: usize,
        current: &PartialFrame,
        incoming: usize,
    ) -> Result<(), AggregateError> {
        let attempted = current.payload.len().saturating_add(incoming);
        if attempted > limit {
            return Err(AggregateError::FrameTooLarge { attempted, limit });
        }
        Ok(())
    }
}

/// Declared `content-length` as a byte count, when present and parseable.
fn declared_content_length(headers: &StompHeaders) -> Option<usize> {
    headers
        .content_length()
        .and_then(|raw| raw.parse::<usize>().ok())
}
