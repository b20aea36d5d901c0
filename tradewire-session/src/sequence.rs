/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Sequence number management.
//!
//! One counter per direction: outbound numbers are allocated atomically
//! with frame emission, inbound numbers advance only when a message is
//! delivered in order. Neither counter resets on reconnect; the flow
//! survives transport rebinds.

use std::sync::atomic::{AtomicU64, Ordering};
use tradewire_core::types::SeqNum;

/// Sequence counters for one session flow.
#[derive(Debug)]
pub struct Sequencer {
    /// Next sequence number to assign to an outbound message.
    next_outbound: AtomicU64,
    /// Sequence number expected on the next inbound message.
    expected_inbound: AtomicU64,
}

impl Sequencer {
    /// Creates a sequencer with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_outbound: AtomicU64::new(1),
            expected_inbound: AtomicU64::new(1),
        }
    }

    /// Allocates the next outbound sequence number.
    ///
    /// Returns the value before the increment.
    #[inline]
    pub fn allocate_outbound(&self) -> SeqNum {
        SeqNum::new(self.next_outbound.fetch_add(1, Ordering::SeqCst))
    }

    /// Returns the next outbound sequence number without allocating it.
    #[inline]
    #[must_use]
    pub fn next_outbound(&self) -> SeqNum {
        SeqNum::new(self.next_outbound.load(Ordering::SeqCst))
    }

    /// Returns the sequence number expected on the next inbound message.
    #[inline]
    #[must_use]
    pub fn expected_inbound(&self) -> SeqNum {
        SeqNum::new(self.expected_inbound.load(Ordering::SeqCst))
    }

    /// Advances the inbound counter after an in-order delivery.
    #[inline]
    pub fn advance_inbound(&self) {
        self.expected_inbound.fetch_add(1, Ordering::SeqCst);
    }

    /// Classifies an inbound sequence number against the expected one.
    #[must_use]
    pub fn classify_inbound(&self, received: SeqNum) -> InboundSequence {
        let expected = self.expected_inbound.load(Ordering::SeqCst);
        let received = received.value();

        if received == expected {
            InboundSequence::InOrder
        } else if received < expected {
            InboundSequence::Duplicate { expected, received }
        } else {
            InboundSequence::Gap { expected, received }
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of inbound sequence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundSequence {
    /// Sequence number is the expected one.
    InOrder,
    /// Sequence number was already delivered.
    Duplicate {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Sequence numbers were skipped.
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_one() {
        let seq = Sequencer::new();
        assert_eq!(seq.next_outbound().value(), 1);
        assert_eq!(seq.expected_inbound().value(), 1);
    }

    #[test]
    fn test_outbound_allocation_is_contiguous() {
        let seq = Sequencer::new();

        for expected in 1..=100u64 {
            assert_eq!(seq.allocate_outbound().value(), expected);
        }
        assert_eq!(seq.next_outbound().value(), 101);
    }

    #[test]
    fn test_inbound_classification() {
        let seq = Sequencer::new();

        assert_eq!(seq.classify_inbound(SeqNum::new(1)), InboundSequence::InOrder);
        seq.advance_inbound();
        seq.advance_inbound();

        assert_eq!(
            seq.classify_inbound(SeqNum::new(1)),
            InboundSequence::Duplicate {
                expected: 3,
                received: 1
            }
        );
        assert_eq!(
            seq.classify_inbound(SeqNum::new(7)),
            InboundSequence::Gap {
                expected: 3,
                received: 7
            }
        );
        assert_eq!(seq.classify_inbound(SeqNum::new(3)), InboundSequence::InOrder);
    }

    #[test]
    fn test_duplicate_does_not_advance() {
        let seq = Sequencer::new();
        seq.advance_inbound();

        let before = seq.expected_inbound();
        let _ = seq.classify_inbound(SeqNum::new(1));
        assert_eq!(seq.expected_inbound(), before);
    }
}
