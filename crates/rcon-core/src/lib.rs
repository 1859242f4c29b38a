//! # rcon-core
//!
//! Shared library for the UDP RCON client containing the wire protocol codec
//! and the bookkeeping structures that turn a stream of datagrams back into
//! command responses.
//!
//! This crate has zero dependencies on network sockets or an async runtime.
//! The session state machine and the transport live in `rcon-client`.
//!
//! # Architecture overview
//!
//! The RCON protocol lets an administrator log in to a game server with a
//! password and issue console commands over UDP.  Every datagram is wrapped
//! in a small envelope:
//!
//! ```text
//! [ 'B' 'E' ][ crc32 (4, little-endian) ][ 0xFF ][ type ][ body... ]
//! ```
//!
//! - **`protocol`** – The envelope codec (`frame`), the outbound packet
//!   builders and inbound packet parser (`packet`), and the 8-bit wrapping
//!   sequence counter (`sequence`).
//!
//! - **`domain`** – Pure bookkeeping with no I/O: the `CorrelationTable`
//!   mapping an outbound command's sequence number to whoever is waiting for
//!   its response, and the `ReassemblyBuffer` that stitches multipart
//!   responses back together.

pub mod domain;
pub mod protocol;

pub use domain::correlation::{CorrelationTable, Responder};
pub use domain::reassembly::ReassemblyBuffer;
pub use protocol::frame::{decode_frame, encode_frame, ProtocolError};
pub use protocol::packet::{CommandBody, InboundPacket, PacketType};
pub use protocol::sequence::SequenceCounter;
