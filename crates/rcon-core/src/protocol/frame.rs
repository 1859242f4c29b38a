//! Envelope codec shared by every RCON datagram.
//!
//! Wire format:
//! ```text
//! [magic:2 = 'B' 'E'][checksum:4][payload:N]
//! ```
//! The checksum is the CRC-32 (IEEE) of the payload, stored little-endian.
//! Every payload starts with the `0xFF` marker followed by the packet type
//! byte, so the smallest meaningful frame is 9 bytes: header, marker, type,
//! and one body byte (a sequence number or a login result).

use thiserror::Error;

/// The two magic bytes at the start of every frame (`"BE"`).
pub const MAGIC: [u8; 2] = [0x42, 0x45];

/// Size of the magic + checksum header that precedes the payload.
pub const HEADER_SIZE: usize = 6;

/// Frames shorter than this are rejected before the checksum is examined.
pub const MIN_FRAME_SIZE: usize = 9;

/// Errors that can occur while unwrapping a frame or parsing its payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The datagram is shorter than [`MIN_FRAME_SIZE`].
    #[error("malformed frame: need at least {MIN_FRAME_SIZE} bytes, got {len}")]
    MalformedFrame { len: usize },

    /// The first two bytes are not the expected `BE` sentinel.
    #[error("bad magic bytes: {0:02X?}")]
    BadMagic([u8; 2]),

    /// The embedded checksum does not match the CRC-32 of the payload.
    #[error("checksum mismatch: frame carries 0x{embedded:08X}, payload hashes to 0x{computed:08X}")]
    ChecksumMismatch { embedded: u32, computed: u32 },

    /// The packet type byte is not login, command, or message.
    #[error("unknown packet type: 0x{0:02X}")]
    UnknownPacketType(u8),

    /// The payload is structurally invalid for its packet type.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Computes the CRC-32 of `payload`.
pub fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Wraps `payload` in the `BE` envelope.
///
/// # Examples
///
/// ```rust
/// use rcon_core::protocol::{decode_frame, encode_frame};
///
/// let frame = encode_frame(&[0xFF, 0x01, 0x00]);
/// assert_eq!(&frame[..2], b"BE");
/// assert_eq!(decode_frame(&frame).unwrap(), &[0xFF, 0x01, 0x00]);
/// ```
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&checksum(payload).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Validates a received datagram and returns the payload it carries.
///
/// # Errors
///
/// - [`ProtocolError::MalformedFrame`] if `frame` is shorter than 9 bytes.
/// - [`ProtocolError::BadMagic`] if it does not start with `BE`.
/// - [`ProtocolError::ChecksumMismatch`] if the payload was corrupted.
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], ProtocolError> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ProtocolError::MalformedFrame { len: frame.len() });
    }

    let magic = [frame[0], frame[1]];
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic(magic));
    }

    let embedded = u32::from_le_bytes([frame[2], frame[3], frame[4], frame[5]]);
    let payload = &frame[HEADER_SIZE..];
    let computed = checksum(payload);
    if embedded != computed {
        return Err(ProtocolError::ChecksumMismatch { embedded, computed });
    }

    Ok(payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_starts_with_magic() {
        // Arrange / Act
        let frame = encode_frame(&[0xFF, 0x00, b'p', b'w']);

        // Assert
        assert_eq!(&frame[..2], &MAGIC);
        assert_eq!(frame.len(), HEADER_SIZE + 4);
    }

    #[test]
    fn test_encode_frame_stores_checksum_little_endian() {
        // Arrange
        let payload = [0xFF, 0x01, 0x00];

        // Act
        let frame = encode_frame(&payload);

        // Assert
        assert_eq!(&frame[2..6], &checksum(&payload).to_le_bytes());
    }

    #[test]
    fn test_encode_frame_matches_known_keepalive_bytes() {
        // Keepalive for sequence 0: CRC-32 of FF 01 00 is 0x58C2DCBE.
        let frame = encode_frame(&[0xFF, 0x01, 0x00]);

        assert_eq!(
            frame,
            vec![0x42, 0x45, 0xBE, 0xDC, 0xC2, 0x58, 0xFF, 0x01, 0x00]
        );
    }

    #[test]
    fn test_decode_frame_returns_payload() {
        // Arrange
        let payload = [0xFF, 0x02, 0x07, b'h', b'i'];
        let frame = encode_frame(&payload);

        // Act
        let decoded = decode_frame(&frame).unwrap();

        // Assert
        assert_eq!(decoded, &payload);
    }

    #[test]
    fn test_decode_frame_rejects_short_frame() {
        // Arrange
        let frame = [0x42, 0x45, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x01];

        // Act
        let err = decode_frame(&frame).unwrap_err();

        // Assert
        assert_eq!(err, ProtocolError::MalformedFrame { len: 8 });
    }

    #[test]
    fn test_decode_frame_rejects_bad_magic() {
        // Arrange
        let mut frame = encode_frame(&[0xFF, 0x01, 0x00]);
        frame[0] = b'X';

        // Act
        let err = decode_frame(&frame).unwrap_err();

        // Assert
        assert_eq!(err, ProtocolError::BadMagic([b'X', b'E']));
    }

    #[test]
    fn test_decode_frame_rejects_corrupted_checksum_field() {
        // Arrange
        let mut frame = encode_frame(&[0xFF, 0x01, 0x00]);
        frame[3] ^= 0x10;

        // Act
        let result = decode_frame(&frame);

        // Assert
        assert!(matches!(result, Err(ProtocolError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_frame_detects_every_single_bit_flip_in_payload() {
        // Arrange
        let frame = encode_frame(&[0xFF, 0x01, 0x2A, b's', b'a', b'y', b' ', b'h', b'i']);

        for byte in HEADER_SIZE..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;

                // Act
                let result = decode_frame(&corrupted);

                // Assert
                assert!(
                    matches!(result, Err(ProtocolError::ChecksumMismatch { .. })),
                    "flip of bit {bit} in byte {byte} must be detected"
                );
            }
        }
    }

    #[test]
    fn test_checksum_of_empty_slice_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }
}
