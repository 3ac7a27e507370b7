//! Transport bindings and the console front-end.
//!
//! Each binding owns one [`Session`](crate::session::Session) and runs a
//! single `select!` loop over three inputs: the network socket, the console
//! channel and (on the datagram side) the retransmission deadline. All
//! printing happens here; the session only decides what to print.

mod console;
mod datagram;
mod stream;

pub use console::*;
pub use datagram::*;
pub use stream::*;

use std::net::SocketAddr;
use std::time::Duration;

use crate::session::Action;
use crate::wire::ClientMessage;

/// Resolved runtime parameters shared by both bindings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address after host-name resolution.
    pub server_addr: SocketAddr,
    /// Confirmation timeout per datagram transmission attempt.
    pub confirm_timeout: Duration,
    /// Retransmissions allowed per datagram before giving up.
    pub max_retransmissions: u8,
}

/// How a completed session ends the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Clean termination: exit code 0.
    Graceful,
    /// The session ended on a protocol violation or server error: exit
    /// code 1. Everything user-facing was already printed by the binding.
    Fatal,
}

/// Print the local half of a transition; return the messages to transmit.
///
/// Shared by both bindings: `Deliver` goes to stdout, `Notify` to stderr,
/// and `Send` is returned for transport-specific transmission.
fn split_actions(actions: Vec<Action>) -> Vec<ClientMessage> {
    let mut sends = Vec::new();
    for action in actions {
        match action {
            Action::Deliver(line) => println!("{line}"),
            Action::Notify(line) => eprintln!("{line}"),
            Action::Send(message) => sends.push(message),
        }
    }
    sends
}
