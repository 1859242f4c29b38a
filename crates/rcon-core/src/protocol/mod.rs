//! Protocol module containing the frame codec, packet layouts, and sequence numbering.

pub mod frame;
pub mod packet;
pub mod sequence;

pub use frame::{checksum, decode_frame, encode_frame, ProtocolError};
pub use packet::*;
pub use sequence::SequenceCounter;
