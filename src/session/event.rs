//! Transport-agnostic inbound events.

use crate::wire::ServerMessage;

/// What the binding observed on its transport, normalized for the session.
///
/// CONFIRM never appears here: the reliability layer consumes it before the
/// state machine runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// REPLY to the outstanding AUTH or JOIN.
    Reply {
        /// OK or NOK.
        success: bool,
        /// Human-readable reason.
        content: String,
    },
    /// Chat message from another participant.
    Chat {
        /// Sender's display name.
        from: String,
        /// Message text.
        content: String,
    },
    /// ERR sent by the server.
    ServerError {
        /// Sender's display name.
        from: String,
        /// Error description.
        content: String,
    },
    /// Server-initiated BYE.
    Bye,
    /// Unparseable or out-of-grammar input; answered with ERR, never
    /// silently dropped.
    Unrecognized,
    /// The transport went away (stream EOF).
    Disconnect,
}

impl Event {
    /// Normalize a decoded server message into an event.
    ///
    /// The caller is expected to have routed messages that are invalid in
    /// the current protocol phase (e.g. an unsolicited REPLY) elsewhere.
    pub fn from_message(message: ServerMessage) -> Self {
        match message {
            ServerMessage::Reply {
                success, content, ..
            } => Event::Reply { success, content },
            ServerMessage::Msg {
                display_name,
                content,
            } => Event::Chat {
                from: display_name,
                content,
            },
            ServerMessage::Err {
                display_name,
                content,
            } => Event::ServerError {
                from: display_name,
                content,
            },
            ServerMessage::Bye => Event::Bye,
        }
    }
}
