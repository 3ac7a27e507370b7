//! Client implementation of the IPK24-CHAT protocol.
//!
//! The protocol carries one message set over two interchangeable transport
//! grammars: a CRLF-delimited text grammar over TCP and a binary grammar
//! over UDP with application-level delivery confirmation. This crate
//! provides:
//!
//! - [`wire`]: pure codecs for both grammars
//! - [`reliable`]: message IDs, the in-flight retransmission slot and
//!   duplicate suppression for the datagram transport
//! - [`session`]: the transport-agnostic protocol state machine
//! - [`client`]: the two transport bindings and the console front-end
//!
//! The layering is strict: `wire` and `reliable` know nothing about
//! sessions, `session` performs no I/O, and only `client` touches sockets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod core;
pub mod reliable;
pub mod session;
pub mod wire;

/// Commonly used types.
pub mod prelude {
    pub use crate::client::{ClientConfig, ExitOutcome, run_datagram, run_stream};
    pub use crate::core::{ClientError, DecodeError};
    pub use crate::session::{Action, Command, Event, Session, SessionState};
    pub use crate::wire::{ClientMessage, ServerMessage};
}
