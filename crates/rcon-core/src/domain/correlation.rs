//! CorrelationTable: who is waiting for the response to which sequence number.
//!
//! When a command is sent, the session registers a [`Responder`] under the
//! command's sequence number.  When a response carrying that number arrives
//! (possibly long after, possibly out of order with other responses) the
//! responder is taken out of the table and handed the response text.
//!
//! The table has one slot per possible sequence number.  An empty slot is
//! `None`; there is no sentinel value that could be mistaken for a
//! registration under sequence 0.

use tracing::warn;

/// A one-shot receiver of a command response.
///
/// Implemented for every `FnOnce(String)`, so plain closures work in tests.
pub trait Responder {
    /// Delivers the response, consuming the responder.
    fn respond(self, response: String);
}

impl<F> Responder for F
where
    F: FnOnce(String),
{
    fn respond(self, response: String) {
        self(response)
    }
}

/// Number of distinct sequence numbers.
const SLOTS: usize = 256;

/// Fixed-size map from sequence number to pending responder.
pub struct CorrelationTable<R> {
    slots: [Option<R>; SLOTS],
    pending: usize,
}

impl<R: Responder> CorrelationTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            pending: 0,
        }
    }

    /// Registers `responder` for `sequence`.
    ///
    /// If another responder is still registered under the same number (the
    /// counter wrapped while an old command was unanswered) the new one
    /// replaces it and the displaced responder is returned, so the caller can
    /// fail it instead of leaving it waiting forever.
    pub fn register(&mut self, sequence: u8, responder: R) -> Option<R> {
        let displaced = self.slots[sequence as usize].replace(responder);
        if displaced.is_some() {
            warn!(sequence, "sequence reused while a command was still pending");
        } else {
            self.pending += 1;
        }
        displaced
    }

    /// Removes and returns the responder for `sequence`, if any.
    pub fn take(&mut self, sequence: u8) -> Option<R> {
        let responder = self.slots[sequence as usize].take();
        if responder.is_some() {
            self.pending -= 1;
        }
        responder
    }

    /// Hands `response` to the responder for `sequence` and removes it.
    ///
    /// Returns `false` without doing anything when nothing is registered,
    /// which covers duplicates and responses to keepalives.
    pub fn resolve(&mut self, sequence: u8, response: String) -> bool {
        match self.take(sequence) {
            Some(responder) => {
                responder.respond(response);
                true
            }
            None => false,
        }
    }

    /// Number of commands still waiting for a response.
    pub fn len(&self) -> usize {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }
}

impl<R: Responder> Default for CorrelationTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
