//! ReassemblyBuffer: stitches multipart command responses back together.
//!
//! A response too large for one datagram is split by the server into parts
//! that share the command's sequence number and carry `(total, index)`.  The
//! buffer appends each fragment to the bytes collected so far for that
//! sequence and hands back the whole response when the part with
//! `index + 1 == total` arrives.
//!
//! Fragments are assumed to arrive in order; no reordering or gap detection
//! is attempted beyond restarting a sequence's entry at index 0.

use std::collections::HashMap;

use tracing::trace;

/// Partial responses keyed by sequence number.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    entries: HashMap<u8, Vec<u8>>,
}

impl ReassemblyBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment for `sequence`.
    ///
    /// A fragment with index 0 starts the response afresh, dropping any bytes
    /// left over from an earlier response under the same sequence whose last
    /// part never arrived.
    ///
    /// Returns the complete response bytes, and forgets the entry, when this
    /// fragment is the last one; returns `None` while parts are outstanding.
    pub fn push(&mut self, sequence: u8, total: u8, index: u8, data: &[u8]) -> Option<Vec<u8>> {
        let buf = self.entries.entry(sequence).or_default();
        if index == 0 {
            buf.clear();
        }
        buf.extend_from_slice(data);
        trace!(sequence, total, index, buffered = buf.len(), "multipart fragment");

        if u16::from(index) + 1 == u16::from(total) {
            self.entries.remove(&sequence)
        } else {
            None
        }
    }

    /// Returns `true` while a response for `sequence` is partially assembled.
    pub fn is_assembling(&self, sequence: u8) -> bool {
        self.entries.contains_key(&sequence)
    }

    /// Number of responses currently being assembled.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_fragments_concatenate_in_order() {
        // Arrange
        let mut buffer = ReassemblyBuffer::new();

        // Act
        let first = buffer.push(4, 3, 0, b"Players ");
        let second = buffer.push(4, 3, 1, b"on ");
        let third = buffer.push(4, 3, 2, b"server");

        // Assert
        assert_eq!(first, None);
        assert_eq!(second, None);
        assert_eq!(third, Some(b"Players on server".to_vec()));
        assert!(buffer.is_empty(), "entry must be dropped on completion");
    }

    #[test]
    fn test_single_part_response_completes_immediately() {
        // Arrange
        let mut buffer = ReassemblyBuffer::new();

        // Act
        let complete = buffer.push(0, 1, 0, b"whole");

        // Assert
        assert_eq!(complete, Some(b"whole".to_vec()));
    }

    #[test]
    fn test_interleaved_sequences_are_kept_apart() {
        // Arrange
        let mut buffer = ReassemblyBuffer::new();

        // Act
        buffer.push(1, 2, 0, b"a1");
        buffer.push(2, 2, 0, b"b1");
        let a = buffer.push(1, 2, 1, b"a2");
        let b = buffer.push(2, 2, 1, b"b2");

        // Assert
        assert_eq!(a, Some(b"a1a2".to_vec()));
        assert_eq!(b, Some(b"b1b2".to_vec()));
    }

    #[test]
    fn test_partial_response_is_reported_as_assembling() {
        // Arrange
        let mut buffer = ReassemblyBuffer::new();

        // Act
        buffer.push(8, 3, 0, b"x");

        // Assert
        assert!(buffer.is_assembling(8));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_fragment_split_utf8_is_joined_before_decoding() {
        // Arrange – "é" is 0xC3 0xA9, split across two fragments
        let mut buffer = ReassemblyBuffer::new();

        // Act
        buffer.push(3, 2, 0, &[b'c', b'a', b'f', 0xC3]);
        let complete = buffer.push(3, 2, 1, &[0xA9]).unwrap();

        // Assert
        assert_eq!(String::from_utf8(complete).unwrap(), "café");
    }

    #[test]
    fn test_first_fragment_discards_incomplete_earlier_response() {
        // Arrange – the last part of the first response under sequence 0 is lost
        let mut buffer = ReassemblyBuffer::new();
        buffer.push(0, 2, 0, b"STALE");

        // Act – a later response reuses sequence 0
        let first = buffer.push(0, 2, 0, b"fresh1");
        let complete = buffer.push(0, 2, 1, b"fresh2");

        // Assert
        assert_eq!(first, None);
        assert_eq!(complete, Some(b"fresh1fresh2".to_vec()));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_total_of_zero_never_completes() {
        // Arrange
        let mut buffer = ReassemblyBuffer::new();

        // Act
        let result = buffer.push(6, 0, 255, b"odd");

        // Assert
        assert_eq!(result, None);
        assert!(buffer.is_assembling(6));
    }
}
