//! The STOMP frame encoder.
//!
//! Serialisation mirrors the decoder's rules in reverse: command line,
//! `name:value` header lines (escaped unless the command is `CONNECT` or
//! `CONNECTED`), a blank line, then the payload. Full frames and terminal
//! content chunks carry the single trailing NUL; intermediate chunks are
//! written verbatim so further chunks can follow.
//!
//! The encoder is stateless apart from a small least-recently-used cache of
//! escaped header names, a pure performance detail that never changes the
//! produced bytes. Encoding already-valid in-memory frames cannot fail, so
//! the [`Encoder`] impl never returns `Err`.

use std::{borrow::Cow, io};

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use crate::frame::{Command, ContentFrame, FullFrame, HeadersFrame, StompFrame};

const NUL: u8 = 0x00;
const LF: u8 = b'\n';
const COLON: u8 = b':';

const ESCAPE_CACHE_CAPACITY: usize = 32;

/// Converts each encoded frame into a caller-defined outer envelope.
///
/// This is the extension seam for wrapping STOMP bytes in a different
/// transport frame (for example a websocket message) without re-implementing
/// the encoding itself. [`RawEnvelope`] is the identity implementation.
pub trait FrameEnvelope {
    /// Envelope type produced per frame.
    type Output;

    /// Wrap an encoded full frame.
    fn full(&mut self, frame: &FullFrame, encoded: Bytes) -> Self::Output;

    /// Wrap an encoded headers frame.
    fn headers(&mut self, frame: &HeadersFrame, encoded: Bytes) -> Self::Output;

    /// Wrap an encoded content chunk (terminal or not).
    fn content(&mut self, frame: &ContentFrame, encoded: Bytes) -> Self::Output;
}

/// Identity envelope: hands back the encoded bytes unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawEnvelope;

impl FrameEnvelope for RawEnvelope {
    type Output = Bytes;

    fn full(&mut self, _frame: &FullFrame, encoded: Bytes) -> Bytes { encoded }

    fn headers(&mut self, _frame: &HeadersFrame, encoded: Bytes) -> Bytes { encoded }

    fn content(&mut self, _frame: &ContentFrame, encoded: Bytes) -> Bytes { encoded }
}

/// Serialises [`StompFrame`]s to bytes.
#[derive(Debug, Default)]
pub struct StompEncoder {
    escape_cache: EscapeCache,
}

impl StompEncoder {
    /// Create an encoder with an empty escape cache.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Encode `frame` and pass the bytes through `envelope`.
    pub fn encode_frame<E: FrameEnvelope>(
        &mut self,
        frame: &StompFrame,
        envelope: &mut E,
    ) -> E::Output {
        match frame {
            StompFrame::Full(full) => {
                let encoded = self.encode_full(full);
                envelope.full(full, encoded)
            }
            StompFrame::Headers(headers) => {
                let encoded = self.encode_headers_frame(headers);
                envelope.headers(headers, encoded)
            }
            StompFrame::Content(content) => {
                envelope.content(content, content.payload().clone())
            }
            StompFrame::LastContent(content) => {
                let mut buf = BytesMut::with_capacity(content.payload().len() + 1);
                buf.put_slice(content.payload());
                buf.put_u8(NUL);
                envelope.content(content, buf.freeze())
            }
        }
    }

    fn encode_full(&mut self, frame: &FullFrame) -> Bytes {
        let mut buf =
            BytesMut::with_capacity(headers_subframe_size(frame.headers().len()) + frame.payload().len() + 1);
        self.write_headers(frame.command(), frame.headers().iter(), &mut buf);
        buf.put_slice(frame.payload());
        buf.put_u8(NUL);
        buf.freeze()
    }

    fn encode_headers_frame(&mut self, frame: &HeadersFrame) -> Bytes {
        let mut buf = BytesMut::with_capacity(headers_subframe_size(frame.headers().len()));
        self.write_headers(frame.command(), frame.headers().iter(), &mut buf);
        buf.freeze()
    }

    fn write_headers<'a>(
        &mut self,
        command: Command,
        headers: impl Iterator<Item = (&'a str, &'a str)>,
        buf: &mut BytesMut,
    ) {
        buf.put_slice(command.as_str().as_bytes());
        buf.put_u8(LF);

        let escape = command.escapes_headers();
        for (name, value) in headers {
            if escape {
                let name = self.escape_cache.escaped(name);
                buf.put_slice(name.as_bytes());
                buf.put_u8(COLON);
                buf.put_slice(escape_text(value).as_bytes());
            } else {
                buf.put_slice(name.as_bytes());
                buf.put_u8(COLON);
                buf.put_slice(value.as_bytes());
            }
            buf.put_u8(LF);
        }

        buf.put_u8(LF);
    }
}

impl Encoder<StompFrame> for StompEncoder {
    type Error = io::Error;

    fn encode(&mut self, frame: StompFrame, dst: &mut BytesMut) -> Result<(), io::Error> {
        let mut raw = RawEnvelope;
        let encoded = self.encode_frame(&frame, &mut raw);
        dst.reserve(encoded.len());
        dst.put_slice(&encoded);
        Ok(())
    }
}

/// Presize hint for the header block: 34 bytes per header line plus command
/// slack, floored at 128, else at 256. A hint only, never a limit.
fn headers_subframe_size(header_count: usize) -> usize {
    let estimated = header_count * 34 + 48;
    if estimated < 128 {
        128
    } else {
        estimated.max(256)
    }
}

/// Escape a header name or value; borrows when nothing needs escaping.
fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', ':', '\n', '\r']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\c"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Fixed-capacity move-to-front cache of escaped header names.
///
/// Header names repeat heavily (`destination`, `content-length`, ...), so a
/// tiny linear-scan LRU beats re-escaping without dragging in a hash map.
#[derive(Debug, Default)]
struct EscapeCache {
    entries: Vec<(String, String)>,
}

impl EscapeCache {
    /// Escaped form of `name`, moved to the front of the cache. Hits borrow
    /// the stored text; only misses allocate.
    fn escaped(&mut self, name: &str) -> &str {
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(0) => {}
            Some(index) => {
                let entry = self.entries.remove(index);
                self.entries.insert(0, entry);
            }
            None => {
                let escaped = escape_text(name).into_owned();
                self.entries.insert(0, (name.to_owned(), escaped));
                self.entries.truncate(ESCAPE_CACHE_CAPACITY);
            }
        }
        &self.entries[0].1
    }
}
