//! Message-ID allocation and the in-flight reliable message.

use std::time::{Duration, Instant};

/// Allocator for outgoing message IDs.
///
/// IDs increase by one for every *new* reliable message and wrap modulo
/// 2^16. Retransmissions reuse the original ID. The counter starts at
/// `0xFFFF` so the first allocated ID is `0x0000`.
#[derive(Debug, Clone)]
pub struct MessageIdCounter {
    current: u16,
}

impl Default for MessageIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageIdCounter {
    /// Create a counter whose first [`next`](Self::next) returns 0.
    pub fn new() -> Self {
        Self { current: u16::MAX }
    }

    /// Allocate the next message ID.
    pub fn next(&mut self) -> u16 {
        self.current = self.current.wrapping_add(1);
        self.current
    }
}

/// Verdict after a confirmation deadline elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutVerdict {
    /// Resend the identical payload; the deadline has been reset.
    Retransmit,
    /// Retry budget exhausted; the session fails fatally.
    GiveUp,
}

/// The single reliable message awaiting its CONFIRM.
///
/// At most one of these exists per session; the protocol serializes reliable
/// sends. The deadline is absolute wall-clock, so unrelated inbound traffic
/// consumes the budget rather than extending it.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    id: u16,
    payload: Vec<u8>,
    retries_remaining: u8,
    timeout: Duration,
    deadline: Instant,
}

impl PendingMessage {
    /// Record a just-sent reliable message.
    pub fn new(id: u16, payload: Vec<u8>, max_retransmissions: u8, timeout: Duration) -> Self {
        Self {
            id,
            payload,
            retries_remaining: max_retransmissions,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    /// The message ID a CONFIRM must echo.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// The exact bytes to put on the wire again on retransmission.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Retransmissions still available.
    pub fn retries_remaining(&self) -> u8 {
        self.retries_remaining
    }

    /// Absolute deadline of the current attempt.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether a received CONFIRM acknowledges this message.
    pub fn is_confirmed_by(&self, ref_id: u16) -> bool {
        self.id == ref_id
    }

    /// Consume one retry after the deadline elapsed.
    ///
    /// On [`TimeoutVerdict::Retransmit`] the caller resends
    /// [`payload`](Self::payload) unchanged; the deadline is already reset.
    pub fn on_timeout(&mut self) -> TimeoutVerdict {
        if self.retries_remaining == 0 {
            return TimeoutVerdict::GiveUp;
        }
        self.retries_remaining -= 1;
        self.deadline = Instant::now() + self.timeout;
        TimeoutVerdict::Retransmit
    }
}
