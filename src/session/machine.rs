//! The protocol-level session states and transition functions.

use tracing::debug;

use crate::wire::ClientMessage;

use super::command::{Command, CommandParseError, HELP_TEXT};
use super::event::Event;

/// Protocol states of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Unauthenticated; only `/auth` and `/help` are meaningful.
    Start,
    /// AUTH sent, REPLY outstanding or retry allowed after NOK.
    Authenticating,
    /// JOIN sent, REPLY outstanding.
    Joining,
    /// Authenticated; chat flows, rejoin allowed.
    Established,
    /// We answered a protocol violation with ERR; BYE follows.
    ErrorReported,
    /// BYE sent, waiting for the close to complete.
    Closing,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Whether the session has reached its terminal state.
    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

/// What the binding must do after a transition.
///
/// The state machine performs no I/O itself; it hands these back in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a chat line to stdout.
    Deliver(String),
    /// Print a protocol event or local error to stderr.
    Notify(String),
    /// Transmit a message (reliably, on the datagram transport).
    Send(ClientMessage),
}

/// One chat session: current state plus the user-visible identity.
///
/// Owned by the transport binding for the connection's whole lifetime and
/// mutated only through the transition methods below. Both bindings drive
/// the same logic; transport concerns (framing, CONFIRM, retransmission)
/// never reach this type.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    display_name: Option<String>,
    awaiting_reply: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session in [`SessionState::Start`].
    pub fn new() -> Self {
        Self {
            state: SessionState::Start,
            display_name: None,
            awaiting_reply: false,
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current display name, if one was chosen.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether an AUTH/JOIN REPLY is outstanding.
    ///
    /// Both bindings defer console command lines while this holds; shutdown
    /// requests are still acted on immediately.
    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    fn display_name_or_default(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| "unknown".to_string())
    }

    /// Apply one user command.
    ///
    /// Malformed or state-inappropriate commands are recoverable: they
    /// produce a [`Action::Notify`] and change nothing.
    pub fn apply_command(&mut self, command: Command) -> Vec<Action> {
        match command {
            Command::Help => vec![Action::Notify(HELP_TEXT.to_string())],

            Command::Rename { display_name } => {
                if self.state.is_terminal() {
                    return Vec::new();
                }
                // Takes effect for subsequently sent messages only.
                self.display_name = Some(display_name);
                Vec::new()
            }

            Command::Auth {
                username,
                secret,
                display_name,
            } => match self.state {
                SessionState::Start | SessionState::Authenticating => {
                    self.display_name = Some(display_name.clone());
                    self.state = SessionState::Authenticating;
                    self.awaiting_reply = true;
                    vec![Action::Send(ClientMessage::Auth {
                        username,
                        display_name,
                        secret,
                    })]
                }
                SessionState::Established | SessionState::Joining => {
                    vec![Action::Notify("ERR: Already authenticated!".to_string())]
                }
                _ => Vec::new(),
            },

            Command::Join { channel_id } => match self.state {
                SessionState::Established => {
                    self.state = SessionState::Joining;
                    self.awaiting_reply = true;
                    vec![Action::Send(ClientMessage::Join {
                        channel_id,
                        display_name: self.display_name_or_default(),
                    })]
                }
                SessionState::Start | SessionState::Authenticating => {
                    vec![Action::Notify("ERR: You are not authenticated!".to_string())]
                }
                _ => Vec::new(),
            },

            Command::Message { content } => match self.state {
                // State unchanged; the reliability layer tracks its own
                // pending/ack cycle for the send.
                SessionState::Established => vec![Action::Send(ClientMessage::Msg {
                    display_name: self.display_name_or_default(),
                    content,
                })],
                SessionState::Start | SessionState::Authenticating => {
                    vec![Action::Notify("ERR: You are not authenticated!".to_string())]
                }
                _ => Vec::new(),
            },
        }
    }

    /// Report a console line that failed to parse. No state change.
    pub fn reject_input(&self, error: &CommandParseError) -> Vec<Action> {
        vec![Action::Notify(format!("ERR: {error}"))]
    }

    /// Apply one inbound event from the transport.
    pub fn apply_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            // Peer termination is graceful from any state.
            Event::Bye => {
                self.state = SessionState::Closed;
                Vec::new()
            }
            // Transport gone: behave like a local shutdown request.
            Event::Disconnect => self.shutdown(),

            Event::Reply { success, content } => self.on_reply(success, content),
            Event::Chat { from, content } => self.on_chat(from, content),
            Event::ServerError { from, content } => self.on_server_error(from, content),
            Event::Unrecognized => self.protocol_error(),
        }
    }

    fn on_reply(&mut self, success: bool, content: String) -> Vec<Action> {
        match self.state {
            SessionState::Authenticating => {
                self.awaiting_reply = false;
                if success {
                    self.state = SessionState::Established;
                    vec![Action::Notify(format!("Success: {content}"))]
                } else {
                    // Stay in Authenticating; the user may retry /auth.
                    vec![Action::Notify(format!("Failure: {content}"))]
                }
            }
            SessionState::Joining => {
                self.awaiting_reply = false;
                // Channel membership is informational either way.
                self.state = SessionState::Established;
                if success {
                    vec![Action::Notify(format!("Success: {content}"))]
                } else {
                    vec![Action::Notify(format!("Failure: {content}"))]
                }
            }
            _ => {
                debug!(state = ?self.state, "ignoring unsolicited REPLY");
                Vec::new()
            }
        }
    }

    fn on_chat(&mut self, from: String, content: String) -> Vec<Action> {
        match self.state {
            SessionState::Established | SessionState::Joining => {
                vec![Action::Deliver(format!("{from}: {content}"))]
            }
            // A chat message before authentication finished is
            // out-of-grammar for the phase.
            SessionState::Start | SessionState::Authenticating => self.protocol_error(),
            _ => Vec::new(),
        }
    }

    fn on_server_error(&mut self, from: String, content: String) -> Vec<Action> {
        match self.state {
            SessionState::Start
            | SessionState::Authenticating
            | SessionState::Joining
            | SessionState::Established => {
                self.state = SessionState::Closing;
                vec![
                    Action::Notify(format!("ERR FROM {from}: {content}")),
                    Action::Send(ClientMessage::Bye),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn protocol_error(&mut self) -> Vec<Action> {
        match self.state {
            SessionState::Start
            | SessionState::Authenticating
            | SessionState::Joining
            | SessionState::Established => {
                self.state = SessionState::ErrorReported;
                vec![
                    Action::Notify("ERR: Unrecognized message from server!".to_string()),
                    Action::Send(ClientMessage::Err {
                        display_name: self.display_name_or_default(),
                        content: "Unrecognized message from server".to_string(),
                    }),
                ]
            }
            _ => Vec::new(),
        }
    }

    /// Handle a local shutdown request (Ctrl-C or console end-of-input).
    ///
    /// From any non-terminal state this sends BYE and moves to
    /// [`SessionState::Closing`]; repeated requests are no-ops.
    pub fn shutdown(&mut self) -> Vec<Action> {
        match self.state {
            SessionState::Closing | SessionState::Closed => Vec::new(),
            _ => {
                self.state = SessionState::Closing;
                self.awaiting_reply = false;
                vec![Action::Send(ClientMessage::Bye)]
            }
        }
    }

    /// The outgoing ERR of [`SessionState::ErrorReported`] has been
    /// delivered; emit the follow-up BYE.
    pub fn finish_error_report(&mut self) -> Vec<Action> {
        if self.state == SessionState::ErrorReported {
            self.state = SessionState::Closing;
            vec![Action::Send(ClientMessage::Bye)]
        } else {
            Vec::new()
        }
    }

    /// The close completed (BYE written on stream / confirmed on datagram).
    pub fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated_session() -> Session {
        let mut session = Session::new();
        session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "pass123".into(),
            display_name: "Alice".into(),
        });
        session.apply_event(Event::Reply {
            success: true,
            content: "welcome".into(),
        });
        session
    }

    #[test]
    fn test_auth_flow_success() {
        let mut session = Session::new();

        let actions = session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "pass123".into(),
            display_name: "Alice".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Send(ClientMessage::Auth {
                username: "alice".into(),
                display_name: "Alice".into(),
                secret: "pass123".into(),
            })]
        );
        assert_eq!(session.state(), SessionState::Authenticating);
        assert!(session.awaiting_reply());

        let actions = session.apply_event(Event::Reply {
            success: true,
            content: "welcome".into(),
        });
        assert_eq!(actions, vec![Action::Notify("Success: welcome".into())]);
        assert_eq!(session.state(), SessionState::Established);
        assert!(!session.awaiting_reply());
    }

    #[test]
    fn test_auth_nok_allows_retry() {
        let mut session = Session::new();
        session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "wrong".into(),
            display_name: "Alice".into(),
        });

        let actions = session.apply_event(Event::Reply {
            success: false,
            content: "bad credentials".into(),
        });
        assert_eq!(actions, vec![Action::Notify("Failure: bad credentials".into())]);
        assert_eq!(session.state(), SessionState::Authenticating);
        assert!(!session.awaiting_reply());

        // Retry is accepted.
        let actions = session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "right".into(),
            display_name: "Alice".into(),
        });
        assert!(matches!(actions[0], Action::Send(ClientMessage::Auth { .. })));
    }

    #[test]
    fn test_commands_rejected_before_auth() {
        let mut session = Session::new();

        let actions = session.apply_command(Command::Message {
            content: "hello".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Notify("ERR: You are not authenticated!".into())]
        );
        let actions = session.apply_command(Command::Join {
            channel_id: "general".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Notify("ERR: You are not authenticated!".into())]
        );
        assert_eq!(session.state(), SessionState::Start);
    }

    #[test]
    fn test_auth_rejected_when_established() {
        let mut session = authenticated_session();
        let actions = session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "pass123".into(),
            display_name: "Alice".into(),
        });
        assert_eq!(actions, vec![Action::Notify("ERR: Already authenticated!".into())]);
        // No network message was produced, state unchanged.
        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn test_chat_delivery() {
        let mut session = authenticated_session();
        let actions = session.apply_event(Event::Chat {
            from: "Bob".into(),
            content: "hello".into(),
        });
        assert_eq!(actions, vec![Action::Deliver("Bob: hello".into())]);
        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn test_send_message_uses_current_display_name() {
        let mut session = authenticated_session();

        session.apply_command(Command::Rename {
            display_name: "Alicia".into(),
        });
        let actions = session.apply_command(Command::Message {
            content: "hi".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Send(ClientMessage::Msg {
                display_name: "Alicia".into(),
                content: "hi".into(),
            })]
        );
        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn test_join_flow() {
        let mut session = authenticated_session();

        let actions = session.apply_command(Command::Join {
            channel_id: "general".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Send(ClientMessage::Join {
                channel_id: "general".into(),
                display_name: "Alice".into(),
            })]
        );
        assert_eq!(session.state(), SessionState::Joining);

        // Chat keeps flowing while the join is pending.
        let actions = session.apply_event(Event::Chat {
            from: "Bob".into(),
            content: "hi".into(),
        });
        assert_eq!(actions, vec![Action::Deliver("Bob: hi".into())]);

        // NOK still returns to Established.
        let actions = session.apply_event(Event::Reply {
            success: false,
            content: "no such channel".into(),
        });
        assert_eq!(actions, vec![Action::Notify("Failure: no such channel".into())]);
        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn test_server_error_triggers_bye() {
        let mut session = authenticated_session();
        let actions = session.apply_event(Event::ServerError {
            from: "Server".into(),
            content: "kicked".into(),
        });
        assert_eq!(
            actions,
            vec![
                Action::Notify("ERR FROM Server: kicked".into()),
                Action::Send(ClientMessage::Bye),
            ]
        );
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[test]
    fn test_server_bye_closes_without_reply() {
        let mut session = authenticated_session();
        let actions = session.apply_event(Event::Bye);
        assert!(actions.is_empty());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_unrecognized_message_path() {
        let mut session = authenticated_session();

        let actions = session.apply_event(Event::Unrecognized);
        assert_eq!(
            actions,
            vec![
                Action::Notify("ERR: Unrecognized message from server!".into()),
                Action::Send(ClientMessage::Err {
                    display_name: "Alice".into(),
                    content: "Unrecognized message from server".into(),
                }),
            ]
        );
        assert_eq!(session.state(), SessionState::ErrorReported);

        // Once the ERR is delivered, BYE follows.
        let actions = session.finish_error_report();
        assert_eq!(actions, vec![Action::Send(ClientMessage::Bye)]);
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[test]
    fn test_chat_while_authenticating_is_protocol_error() {
        let mut session = Session::new();
        session.apply_command(Command::Auth {
            username: "alice".into(),
            secret: "s".into(),
            display_name: "Alice".into(),
        });

        let actions = session.apply_event(Event::Chat {
            from: "Bob".into(),
            content: "early".into(),
        });
        assert!(matches!(actions[1], Action::Send(ClientMessage::Err { .. })));
        assert_eq!(session.state(), SessionState::ErrorReported);
    }

    #[test]
    fn test_shutdown_from_any_state() {
        let mut session = Session::new();
        let actions = session.shutdown();
        assert_eq!(actions, vec![Action::Send(ClientMessage::Bye)]);
        assert_eq!(session.state(), SessionState::Closing);

        // Idempotent while closing.
        assert!(session.shutdown().is_empty());

        session.mark_closed();
        assert!(session.shutdown().is_empty());
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_rename_before_auth() {
        let mut session = Session::new();
        session.apply_command(Command::Rename {
            display_name: "Early".into(),
        });
        assert_eq!(session.display_name(), Some("Early"));
        assert_eq!(session.state(), SessionState::Start);
    }

    #[test]
    fn test_unsolicited_reply_ignored() {
        let mut session = authenticated_session();
        let actions = session.apply_event(Event::Reply {
            success: true,
            content: "stray".into(),
        });
        assert!(actions.is_empty());
        assert_eq!(session.state(), SessionState::Established);
    }
}
