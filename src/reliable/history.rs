//! Duplicate suppression for inbound message IDs.

use std::collections::HashSet;

/// Set of peer message IDs already processed.
///
/// A retransmitted peer message must be CONFIRMed again (its original
/// CONFIRM may have been lost) but must not be re-delivered or re-drive the
/// state machine. IDs are per-session and never removed; the set is bounded
/// by the number of messages received in the session.
#[derive(Debug, Default)]
pub struct SeenIds {
    seen: HashSet<u16>,
}

impl SeenIds {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as processed.
    ///
    /// Returns `true` on first sighting; `false` means the message was
    /// already acted upon and only the CONFIRM should be repeated.
    pub fn check_and_mark(&mut self, id: u16) -> bool {
        self.seen.insert(id)
    }

    /// Number of distinct IDs processed so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no ID has been processed yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting() {
        let mut seen = SeenIds::new();
        assert!(seen.check_and_mark(1));
        assert!(seen.check_and_mark(2));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut seen = SeenIds::new();
        assert!(seen.check_and_mark(7));
        assert!(!seen.check_and_mark(7));
        assert!(!seen.check_and_mark(7));
        assert_eq!(seen.len(), 1);
    }
}
