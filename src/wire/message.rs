//! Typed protocol messages, shared by both codecs.

/// A message sent by the client.
///
/// Owned value, built once from a user command (or by the session for ERR
/// and BYE) and consumed by the codec at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Authentication request.
    Auth {
        /// Login name.
        username: String,
        /// Name shown to other participants.
        display_name: String,
        /// Shared secret.
        secret: String,
    },
    /// Channel join request.
    Join {
        /// Target channel.
        channel_id: String,
        /// Name shown to other participants.
        display_name: String,
    },
    /// Chat message.
    Msg {
        /// Sender's display name.
        display_name: String,
        /// Message text.
        content: String,
    },
    /// Protocol error report sent to the server.
    Err {
        /// Sender's display name.
        display_name: String,
        /// Error description.
        content: String,
    },
    /// Graceful termination.
    Bye,
}

/// A message received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Result of an AUTH or JOIN request.
    Reply {
        /// `true` for OK, `false` for NOK.
        success: bool,
        /// On the datagram transport, the ID of the request this answers.
        /// Always 0 on the stream transport, which has no message IDs.
        ref_id: u16,
        /// Human-readable reason.
        content: String,
    },
    /// Chat message from another participant.
    Msg {
        /// Sender's display name.
        display_name: String,
        /// Message text.
        content: String,
    },
    /// Error reported by the server; the session answers with BYE.
    Err {
        /// Sender's display name.
        display_name: String,
        /// Error description.
        content: String,
    },
    /// Server-initiated termination.
    Bye,
}
