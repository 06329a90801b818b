//! Incremental line and header tokenization.
//!
//! Both tokenizers consume bytes from a [`BytesMut`] cursor one at a time
//! and return `Ok(None)` when the buffer runs out before a line terminator,
//! leaving all accumulated state in place for the next resumption. Network
//! reads can split the input anywhere, including in the middle of a
//! multi-byte UTF-8 sequence, so the partially assembled code point is part
//! of that suspended state.

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::error::DecodeError;

pub(crate) const NUL: u8 = 0x00;
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
const COLON: u8 = b':';

/// Byte-at-a-time UTF-8 assembly.
///
/// ASCII passes through, leads in `0xC0..=0xDF` open a two-byte sequence,
/// and any other lead is treated as opening a three-byte sequence;
/// continuation bytes contribute six bits each. Accumulations that do not
/// form a scalar value fall back to U+FFFD.
#[derive(Debug, Default)]
struct Utf8Accumulator {
    interim: u32,
    awaiting_continuation: bool,
}

impl Utf8Accumulator {
    /// Feed one byte; returns a completed character when one is ready.
    fn push(&mut self, byte: u8) -> Option<char> {
        if self.awaiting_continuation {
            self.interim |= u32::from(byte & 0x3F) << 6;
            self.awaiting_continuation = false;
            None
        } else if self.interim != 0 {
            let code = self.interim | u32::from(byte & 0x3F);
            self.interim = 0;
            Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
        } else if byte < 0x80 {
            Some(char::from(byte))
        } else if byte & 0xE0 == 0xC0 {
            self.interim = u32::from(byte & 0x1F) << 6;
            None
        } else {
            self.interim = u32::from(byte & 0x0F) << 12;
            self.awaiting_continuation = true;
            None
        }
    }

    fn reset(&mut self) {
        self.interim = 0;
        self.awaiting_continuation = false;
    }
}

/// Extracts one LF-terminated line at a time, tolerating a preceding CR.
///
/// Used for command lines; header lines go through [`HeaderTokenizer`].
#[derive(Debug)]
pub(crate) struct LineTokenizer {
    acc: String,
    utf8: Utf8Accumulator,
    line_length: usize,
    max_line_length: usize,
}

impl LineTokenizer {
    pub(crate) fn new(max_line_length: usize) -> Self {
        Self {
            acc: String::new(),
            utf8: Utf8Accumulator::default(),
            line_length: 0,
            max_line_length,
        }
    }

    /// Consume bytes up to and including the next LF.
    ///
    /// Returns the decoded line without its terminator, or `Ok(None)` when
    /// the available bytes hold no LF yet. CR bytes count toward the line
    /// limit but are not stored.
    pub(crate) fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<String>, DecodeError> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if byte == CR {
                self.line_length += 1;
                continue;
            }
            if byte == LF {
                let line = std::mem::take(&mut self.acc);
                self.reset();
                return Ok(Some(line));
            }
            self.line_length += 1;
            if self.line_length > self.max_line_length {
                let limit = self.max_line_length;
                self.reset();
                return Err(DecodeError::LineTooLong { limit });
            }
            if let Some(ch) = self.utf8.push(byte) {
                self.acc.push(ch);
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.acc.clear();
        self.utf8.reset();
        self.line_length = 0;
    }
}

/// One parsed header line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum HeaderEvent {
    /// A `name:value` entry.
    Entry(String, String),
    /// The blank line terminating the header block.
    End,
}

enum LineStep {
    Continue,
    Complete,
}

/// Header-line tokenizer: colon splitting and escape resolution layered on
/// top of the line rules.
///
/// The first unescaped colon separates name from value. With escaping
/// active a further raw colon marks the line invalid; for `CONNECT` and
/// `CONNECTED` frames (escaping off) raw colons in the value are kept
/// verbatim. Invalid lines are skipped unless validation is enabled, in
/// which case they fail the frame.
#[derive(Debug)]
pub(crate) struct HeaderTokenizer {
    acc: String,
    utf8: Utf8Accumulator,
    line_length: usize,
    max_line_length: usize,
    validate: bool,
    name: Option<String>,
    valid: bool,
    unescape: bool,
    escape_pending: bool,
}

impl HeaderTokenizer {
    pub(crate) fn new(max_line_length: usize, validate: bool) -> Self {
        Self {
            acc: String::new(),
            utf8: Utf8Accumulator::default(),
            line_length: 0,
            max_line_length,
            validate,
            name: None,
            valid: false,
            unescape: true,
            escape_pending: false,
        }
    }

    /// Select whether escape sequences are resolved for the current frame.
    pub(crate) fn set_unescape(&mut self, unescape: bool) { self.unescape = unescape; }

    /// Consume bytes until a header entry or the end-of-headers line is
    /// complete, skipping invalid lines when validation is off.
    ///
    /// Returns `Ok(None)` when the buffer is exhausted mid-line.
    pub(crate) fn next_header(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<HeaderEvent>, DecodeError> {
        loop {
            match self.advance_line(src) {
                Ok(None) => return Ok(None),
                Ok(Some(())) => {}
                Err(err) => {
                    self.reset_line();
                    return Err(err);
                }
            }

            let name = self.name.take();
            let text = std::mem::take(&mut self.acc);
            let valid = self.valid;
            self.reset_line();

            match name {
                None if text.is_empty() => return Ok(Some(HeaderEvent::End)),
                Some(name) if valid => return Ok(Some(HeaderEvent::Entry(name, text))),
                name => {
                    let line = match name {
                        Some(name) if !name.is_empty() => format!("{name}:{text}"),
                        _ => text,
                    };
                    if self.validate {
                        return Err(DecodeError::MalformedHeaderLine { line });
                    }
                    debug!(line, "skipping invalid header line");
                }
            }
        }
    }

    /// Consume bytes for the current line; `Ok(Some(()))` once the LF is
    /// reached.
    fn advance_line(&mut self, src: &mut BytesMut) -> Result<Option<()>, DecodeError> {
        while src.has_remaining() {
            match self.process_byte(src.get_u8())? {
                LineStep::Continue => {}
                LineStep::Complete => return Ok(Some(())),
            }
        }
        Ok(None)
    }

    fn process_byte(&mut self, byte: u8) -> Result<LineStep, DecodeError> {
        if byte == CR {
            self.line_length += 1;
            return Ok(LineStep::Continue);
        }
        if byte == LF {
            if self.escape_pending {
                self.acc.push('\\');
                return Err(DecodeError::InvalidEscapeSequence {
                    text: self.acc.clone(),
                });
            }
            return Ok(LineStep::Complete);
        }

        if byte == COLON {
            if self.name.is_some() {
                // A raw colon in the value: prohibited when escaping is
                // active, verbatim for CONNECT/CONNECTED.
                if self.unescape {
                    self.valid = false;
                }
            } else if self.acc.is_empty() {
                self.name = Some(String::new());
            } else {
                self.name = Some(std::mem::take(&mut self.acc));
                self.valid = true;
                return Ok(LineStep::Continue);
            }
        }

        self.line_length += 1;
        if self.line_length > self.max_line_length {
            return Err(DecodeError::LineTooLong {
                limit: self.max_line_length,
            });
        }

        if let Some(ch) = self.utf8.push(byte) {
            self.append_char(ch)?;
        }
        Ok(LineStep::Continue)
    }

    fn append_char(&mut self, ch: char) -> Result<(), DecodeError> {
        if !self.unescape {
            self.acc.push(ch);
            return Ok(());
        }

        if ch == '\\' {
            if self.escape_pending {
                self.acc.push('\\');
                self.escape_pending = false;
            } else {
                self.escape_pending = true;
            }
            return Ok(());
        }

        if self.escape_pending {
            self.escape_pending = false;
            match ch {
                'c' => self.acc.push(':'),
                'r' => self.acc.push('\r'),
                'n' => self.acc.push('\n'),
                other => {
                    self.acc.push('\\');
                    self.acc.push(other);
                    return Err(DecodeError::InvalidEscapeSequence {
                        text: self.acc.clone(),
                    });
                }
            }
            return Ok(());
        }

        self.acc.push(ch);
        Ok(())
    }

    fn reset_line(&mut self) {
        self.acc.clear();
        self.utf8.reset();
        self.line_length = 0;
        self.name = None;
        self.valid = false;
        self.escape_pending = false;
    }
}
