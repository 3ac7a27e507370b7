//! Error types for the IPK24-CHAT client.

use thiserror::Error;

/// Errors produced while decoding a wire message.
///
/// A decode failure is a protocol violation by the peer: the binding maps it
/// to the unrecognized-message event so the session can answer with ERR
/// instead of silently dropping the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The first token / type tag is outside the grammar.
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// A fixed keyword or field did not match.
    #[error("expected {expected}, got {actual}")]
    UnexpectedToken {
        /// Keyword or field the grammar requires at this position.
        expected: &'static str,
        /// What was actually found.
        actual: String,
    },

    /// The message ended before a required field.
    #[error("unexpected end of message")]
    UnexpectedEof,

    /// Datagram too short to hold the fixed-position header.
    #[error("datagram too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected size.
        expected: usize,
        /// Actual size received.
        actual: usize,
    },

    /// Message exceeds the protocol's maximum size.
    #[error("message too long: limit {limit} bytes, got {actual}")]
    TooLong {
        /// Maximum allowed size.
        limit: usize,
        /// Actual size observed.
        actual: usize,
    },

    /// A string field ran to the end of the buffer without a null terminator.
    #[error("string field missing null terminator")]
    MissingTerminator,

    /// A REPLY result byte outside {0, 1}.
    #[error("invalid reply result: 0x{0:02x}")]
    InvalidReplyResult(u8),

    /// Leftover bytes after the last field of a fixed-shape message.
    #[error("trailing data after message")]
    TrailingData,
}

/// Fatal client errors.
///
/// Anything of this type short-circuits the binding loop; the process exits
/// with code 1. Recoverable conditions (malformed user commands, a single
/// bad server message) never surface here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Host name did not resolve to a usable address.
    #[error("failed to resolve {0}")]
    Resolve(String),

    /// Connection or socket establishment failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A reliable message ran out of retransmission attempts.
    #[error("no confirmation after {retries} retransmissions")]
    RetransmitExhausted {
        /// Retransmissions performed before giving up.
        retries: u8,
    },

    /// The peer stopped responding while a reply was awaited.
    #[error("server did not respond")]
    ReplyTimeout,

    /// I/O error on the socket or console.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
