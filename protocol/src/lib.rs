//! Wire protocol: incremental framing over an arbitrarily chunked byte stream.
//!
//! [`FrameReader`] is the shared reassembler. It is parameterised by a
//! [`Framing`] rule that says how long the next record is once its leading
//! bytes are known, and what to emit once it is complete:
//!
//! - [`MessageFraming`]: 8-byte header, then a body whose length depends on
//!   the message type and extension bits ([`body_length`]).
//! - [`BlockStreamFraming`]: bulk_pull responses, one type tag then a fixed body.
//! - [`FrontierStreamFraming`]: frontier_req responses, fixed 64-byte records.

pub mod bootstrap;
pub mod encode;
pub mod error;
pub mod frame;
pub mod message_decoder;

pub use bootstrap::{
    BlockStreamDecoder, BlockStreamEvent, BlockStreamFraming, FrontierStreamDecoder,
    FrontierStreamEvent, FrontierStreamFraming, FRONTIER_RECORD_SIZE,
};
pub use encode::{encode_message, MessageEncoder};
pub use error::ProtocolError;
pub use frame::{FrameReader, Framing};
pub use message_decoder::{body_length, DecodedMessage, MessageDecoder, MessageFraming};
