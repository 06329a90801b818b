//! Streaming codec for the STOMP text messaging protocol.
//!
//! `stompwire` converts an arbitrarily fragmented byte stream into typed
//! [`StompFrame`]s and back, without requiring a complete frame in memory:
//! large bodies are emitted as bounded content chunks. The pieces compose as
//!
//! ```text
//! bytes -> StompDecoder -> frames -> StompAggregator -> full frames
//!          StompEncoder <- frames
//! ```
//!
//! The decoder and encoder implement `tokio_util`'s [`Decoder`] and
//! [`Encoder`] traits so they slot into `FramedRead` / `FramedWrite`, but
//! nothing here performs I/O; every operation is synchronous byte work
//! driven by whoever owns the transport. One decoder and one aggregator
//! serve exactly one stream each.
//!
//! ```
//! use bytes::BytesMut;
//! use stompwire::{StompAggregator, StompDecoder, StompFrame};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = StompDecoder::new();
//! let mut aggregator = StompAggregator::new(1024);
//! let mut input = BytesMut::from(
//!     "SEND\ndestination:/queue/a\ncontent-length:3\n\nabc\0".as_bytes(),
//! );
//!
//! while let Some(frame) = decoder.decode(&mut input).expect("decode never errors") {
//!     if let Some(full) = aggregator.push(frame).expect("within limit") {
//!         assert_eq!(full.payload().as_ref(), b"abc");
//!     }
//! }
//! ```
//!
//! [`Decoder`]: tokio_util::codec::Decoder
//! [`Encoder`]: tokio_util::codec::Encoder

pub mod aggregator;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
mod tokenizer;

pub use aggregator::StompAggregator;
pub use decoder::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_LINE_LENGTH, StompDecoder};
pub use encoder::{FrameEnvelope, RawEnvelope, StompEncoder};
pub use error::{AggregateError, DecodeError};
pub use frame::{
    Command,
    ContentFrame,
    DecodeResult,
    FullFrame,
    HeadersFrame,
    StompFrame,
    StompHeaders,
};
