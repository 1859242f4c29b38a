//! 8-bit sequence counter for outbound commands and keepalives.
//!
//! The server echoes the sequence byte of every command back in its
//! response, which is the only way to tell which response belongs to which
//! command: UDP may deliver responses in any order.  With a single byte the
//! counter wraps from 255 back to 0, so at most 256 commands can be in flight
//! before a number is reused.

/// A wrapping counter over the 0–255 sequence space.
///
/// The counter is owned by exactly one session, which serializes all
/// access, so no atomics are needed.
///
/// # Examples
///
/// ```rust
/// use rcon_core::protocol::SequenceCounter;
///
/// let mut counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number and advances the counter,
    /// wrapping from 255 to 0.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u8 {
        let seq = self.next;
        self.next = self.next.wrapping_add(1);
        seq
    }
}
