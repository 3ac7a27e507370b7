//! Console-line parsing into user commands.

/// A user-issued instruction, parsed from one console line.
///
/// Immutable once created and consumed exactly once, either immediately
/// (stream binding) or via the command queue (datagram binding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/auth <username> <secret> <display_name>`
    Auth {
        /// Login name.
        username: String,
        /// Shared secret.
        secret: String,
        /// Name shown to other participants.
        display_name: String,
    },
    /// `/join <channel_id>`
    Join {
        /// Target channel.
        channel_id: String,
    },
    /// `/rename <display_name>` (local only, no network effect).
    Rename {
        /// New display name.
        display_name: String,
    },
    /// `/help`
    Help,
    /// Any line not starting with `/`: a chat message.
    Message {
        /// Message text, the whole line.
        content: String,
    },
}

/// Why a console line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// `/auth`, `/join` or `/rename` with the wrong argument count.
    WrongArity {
        /// The offending command name, without the slash.
        command: &'static str,
    },
    /// A slash command outside the known set.
    UnknownCommand(String),
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongArity { command } => {
                write!(f, "wrong number of parameters for /{command}")
            }
            Self::UnknownCommand(name) => write!(f, "unknown command: {name}"),
        }
    }
}

impl Command {
    /// Parse one console line (newline already stripped).
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        if !line.starts_with('/') {
            return Ok(Command::Message {
                content: line.to_string(),
            });
        }

        let mut parts = line.split(' ');
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match name {
            "/auth" => match args.as_slice() {
                [username, secret, display_name] => Ok(Command::Auth {
                    username: (*username).to_string(),
                    secret: (*secret).to_string(),
                    display_name: (*display_name).to_string(),
                }),
                _ => Err(CommandParseError::WrongArity { command: "auth" }),
            },
            "/join" => match args.as_slice() {
                [channel_id] => Ok(Command::Join {
                    channel_id: (*channel_id).to_string(),
                }),
                _ => Err(CommandParseError::WrongArity { command: "join" }),
            },
            "/rename" => match args.as_slice() {
                [display_name] => Ok(Command::Rename {
                    display_name: (*display_name).to_string(),
                }),
                _ => Err(CommandParseError::WrongArity { command: "rename" }),
            },
            "/help" => Ok(Command::Help),
            other => Err(CommandParseError::UnknownCommand(other.to_string())),
        }
    }
}

/// Usage text printed by `/help`.
pub const HELP_TEXT: &str = "\
Commands:
  /auth <username> <secret> <display_name>   authenticate to the server
  /join <channel_id>                         join a channel
  /rename <display_name>                     change the displayed name locally
  /help                                      print this help
Any other line is sent as a chat message once authenticated.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth() {
        assert_eq!(
            Command::parse("/auth alice pass123 Alice").unwrap(),
            Command::Auth {
                username: "alice".into(),
                secret: "pass123".into(),
                display_name: "Alice".into(),
            }
        );
    }

    #[test]
    fn test_parse_auth_wrong_arity() {
        assert_eq!(
            Command::parse("/auth alice pass123"),
            Err(CommandParseError::WrongArity { command: "auth" })
        );
        assert_eq!(
            Command::parse("/auth a b c d"),
            Err(CommandParseError::WrongArity { command: "auth" })
        );
    }

    #[test]
    fn test_parse_join_rename_help() {
        assert_eq!(
            Command::parse("/join general").unwrap(),
            Command::Join {
                channel_id: "general".into()
            }
        );
        assert_eq!(
            Command::parse("/rename Bob").unwrap(),
            Command::Rename {
                display_name: "Bob".into()
            }
        );
        assert_eq!(Command::parse("/help").unwrap(), Command::Help);
        assert_eq!(
            Command::parse("/join"),
            Err(CommandParseError::WrongArity { command: "join" })
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            Command::parse("/quit"),
            Err(CommandParseError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_plain_line_is_message() {
        assert_eq!(
            Command::parse("hello everyone").unwrap(),
            Command::Message {
                content: "hello everyone".into()
            }
        );
    }
}
