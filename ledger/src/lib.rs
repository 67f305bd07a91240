//! Block codec for the block-lattice.
//!
//! Each account has its own append-only chain. Blocks travel and are stored
//! in one of five fixed binary layouts selected by a leading type tag; the
//! storing node appends a type-specific sideband carrying ledger-order
//! metadata. Everything here is a pure, stateless transform: malformed input
//! produces a [`CodecError`], never a panic.

pub mod block;
pub mod block_type;
pub mod error;
mod reader;
pub mod sideband;
pub mod stored;

pub use block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock};
pub use block_type::BlockType;
pub use error::CodecError;
pub use sideband::{BlockDetails, Sideband};
pub use stored::StoredBlock;
