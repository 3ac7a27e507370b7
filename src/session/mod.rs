//! Session state machine shared by both transport bindings.
//!
//! The bindings decode transport-specific input into a common [`Event`] set
//! and feed it, together with parsed user [`Command`]s, into one [`Session`].
//! Transitions come back as [`Action`] lists; the binding performs the
//! actual sends and prints. Transport-specific behavior (framing,
//! CONFIRM/retransmission) stays on the binding side of this boundary.

mod command;
mod event;
mod machine;

pub use command::*;
pub use event::*;
pub use machine::*;
