//! Packet layouts carried inside a frame.
//!
//! Every payload starts with the same two bytes:
//! ```text
//! [marker:1 = 0xFF][packet_type:1][body:N]
//! ```
//!
//! | Type | Direction | Body |
//! |------|-----------|------|
//! | `0x00` Login   | client → server | password bytes |
//! | `0x00` Login   | server → client | `0x01` accepted / `0x00` rejected |
//! | `0x01` Command | client → server | sequence, command text (empty for keepalive) |
//! | `0x01` Command | server → client | sequence, response text or multipart fragment |
//! | `0x02` Message | server → client | sequence, message text |
//! | `0x02` Message | client → server | sequence (acknowledgement) |
//!
//! A multipart fragment is a command response whose fourth payload byte is
//! `0x00`, followed by the total number of parts and this part's index:
//! ```text
//! [0xFF][0x01][seq][0x00][total][index][fragment...]
//! ```

use crate::protocol::frame::{decode_frame, encode_frame, ProtocolError};

/// First byte of every payload.
pub const PAYLOAD_MARKER: u8 = 0xFF;

/// Offset at which a multipart fragment's data begins.
const FRAGMENT_DATA_OFFSET: usize = 6;

// ── Packet type codes ─────────────────────────────────────────────────────────

/// The packet type byte at payload offset 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Login = 0x00,
    Command = 0x01,
    Message = 0x02,
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(PacketType::Login),
            0x01 => Ok(PacketType::Command),
            0x02 => Ok(PacketType::Message),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }
}

// ── Outbound payload builders ─────────────────────────────────────────────────

fn payload_with_capacity(packet_type: PacketType, body_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + body_len);
    buf.push(PAYLOAD_MARKER);
    buf.push(packet_type as u8);
    buf
}

/// Builds the login payload `[0xFF, 0x00, password...]`.
pub fn login_payload(password: &str) -> Vec<u8> {
    let mut buf = payload_with_capacity(PacketType::Login, password.len());
    buf.extend_from_slice(password.as_bytes());
    buf
}

/// Builds the command payload `[0xFF, 0x01, seq, command...]`.
///
/// The caller owns sequence allocation so that it can register the matching
/// correlation entry under the same number.
pub fn command_payload(sequence: u8, command: &str) -> Vec<u8> {
    let mut buf = payload_with_capacity(PacketType::Command, 1 + command.len());
    buf.push(sequence);
    buf.extend_from_slice(command.as_bytes());
    buf
}

/// Builds the keepalive payload: a command with an empty body.
pub fn keepalive_payload(sequence: u8) -> Vec<u8> {
    command_payload(sequence, "")
}

/// Builds the acknowledgement `[0xFF, 0x02, seq]` for a server message.
pub fn message_ack_payload(sequence: u8) -> Vec<u8> {
    let mut buf = payload_with_capacity(PacketType::Message, 1);
    buf.push(sequence);
    buf
}

/// Builds a complete login datagram.
pub fn login_packet(password: &str) -> Vec<u8> {
    encode_frame(&login_payload(password))
}

/// Builds a complete command datagram.
pub fn command_packet(sequence: u8, command: &str) -> Vec<u8> {
    encode_frame(&command_payload(sequence, command))
}

/// Builds a complete keepalive datagram.
pub fn keepalive_packet(sequence: u8) -> Vec<u8> {
    encode_frame(&keepalive_payload(sequence))
}

/// Builds a complete message acknowledgement datagram.
pub fn message_ack_packet(sequence: u8) -> Vec<u8> {
    encode_frame(&message_ack_payload(sequence))
}

// ── Inbound packets ───────────────────────────────────────────────────────────

/// The body of an inbound command packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBody {
    /// No body at all: the acknowledgement of a keepalive, or the response
    /// to a command that produced no output.
    Empty,
    /// A complete, single-datagram response.
    Text(String),
    /// One part of a response the server split across several datagrams.
    Fragment {
        total: u8,
        index: u8,
        data: Vec<u8>,
    },
}

/// A packet received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPacket {
    /// Result of a login attempt.
    Login { success: bool },
    /// Response (or part of one) to the command sent with `sequence`.
    Command { sequence: u8, body: CommandBody },
    /// Server-pushed message that must be acknowledged with `sequence`.
    Message { sequence: u8, text: String },
}

/// Classifies a validated payload.
///
/// # Errors
///
/// - [`ProtocolError::MalformedPayload`] if the payload is shorter than three
///   bytes, or carries a multipart marker without a complete fragment header.
/// - [`ProtocolError::UnknownPacketType`] for a type byte other than 0, 1, 2.
pub fn parse_inbound(payload: &[u8]) -> Result<InboundPacket, ProtocolError> {
    if payload.len() < 3 {
        return Err(ProtocolError::MalformedPayload(format!(
            "payload of {} bytes has no body",
            payload.len()
        )));
    }

    let sequence = payload[2];
    match PacketType::try_from(payload[1])? {
        PacketType::Login => Ok(InboundPacket::Login {
            success: payload[2] == 0x01,
        }),
        PacketType::Command => {
            let body = parse_command_body(payload)?;
            Ok(InboundPacket::Command { sequence, body })
        }
        PacketType::Message => Ok(InboundPacket::Message {
            sequence,
            text: String::from_utf8_lossy(&payload[3..]).into_owned(),
        }),
    }
}

fn parse_command_body(payload: &[u8]) -> Result<CommandBody, ProtocolError> {
    if payload.len() == 3 {
        return Ok(CommandBody::Empty);
    }

    let is_multipart = payload.len() > 4 && payload[3] == 0x00;
    if !is_multipart {
        return Ok(CommandBody::Text(
            String::from_utf8_lossy(&payload[3..]).into_owned(),
        ));
    }

    if payload.len() < FRAGMENT_DATA_OFFSET {
        return Err(ProtocolError::MalformedPayload(
            "multipart marker without part index".to_string(),
        ));
    }

    Ok(CommandBody::Fragment {
        total: payload[4],
        index: payload[5],
        data: payload[FRAGMENT_DATA_OFFSET..].to_vec(),
    })
}

/// Unwraps a datagram and classifies its payload in one step.
///
/// # Errors
///
/// Returns any [`ProtocolError`] from [`decode_frame`] or [`parse_inbound`].
pub fn decode_packet(frame: &[u8]) -> Result<InboundPacket, ProtocolError> {
    parse_inbound(decode_frame(frame)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
