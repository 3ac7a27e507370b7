//! Application-level reliability for the datagram transport.
//!
//! The datagram grammar is carried over plain UDP; delivery is made reliable
//! by a CONFIRM/retransmission scheme:
//!
//! - [`MessageIdCounter`]: per-session u16 IDs, wrapping modulo 2^16.
//! - [`PendingMessage`]: the single in-flight reliable message, with its
//!   retry budget and absolute deadline.
//! - [`SeenIds`]: inbound duplicate suppression.
//! - [`CommandQueue`]: user commands parked until the in-flight slot frees.
//!
//! The stream transport uses none of this; TCP already provides ordering and
//! delivery.

mod history;
mod pending;
mod queue;

pub use history::*;
pub use pending::*;
pub use queue::*;
