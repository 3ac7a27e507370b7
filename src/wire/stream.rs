//! Text codec for the stream (TCP) transport grammar.
//!
//! Each message is one CRLF-terminated line. Keywords are matched
//! case-insensitively, fields are separated by single spaces, and the final
//! content field runs to the end of the line.

use crate::core::{DecodeError, MAX_MESSAGE_SIZE};

use super::message::{ClientMessage, ServerMessage};

/// Encode a client message as a CRLF-terminated line.
pub fn encode_stream(message: &ClientMessage) -> String {
    match message {
        ClientMessage::Auth {
            username,
            display_name,
            secret,
        } => format!("AUTH {username} AS {display_name} USING {secret}\r\n"),
        ClientMessage::Join {
            channel_id,
            display_name,
        } => format!("JOIN {channel_id} AS {display_name}\r\n"),
        ClientMessage::Msg {
            display_name,
            content,
        } => format!("MSG FROM {display_name} IS {content}\r\n"),
        ClientMessage::Err {
            display_name,
            content,
        } => format!("ERR FROM {display_name} IS {content}\r\n"),
        ClientMessage::Bye => "BYE\r\n".to_string(),
    }
}

/// Decode one line (CRLF already stripped) into a server message.
///
/// Parsing is strict left-to-right token matching: a missing or mismatched
/// keyword fails the decode. `BYE` must have no trailing content.
pub fn decode_stream(line: &str) -> Result<ServerMessage, DecodeError> {
    let mut tokens = Tokens::new(line);
    let kind = tokens.next_token()?;

    if kind.eq_ignore_ascii_case("MSG") {
        tokens.expect_keyword("FROM")?;
        let display_name = tokens.next_token()?.to_string();
        tokens.expect_keyword("IS")?;
        let content = tokens.rest()?.to_string();
        Ok(ServerMessage::Msg {
            display_name,
            content,
        })
    } else if kind.eq_ignore_ascii_case("ERR") {
        tokens.expect_keyword("FROM")?;
        let display_name = tokens.next_token()?.to_string();
        tokens.expect_keyword("IS")?;
        let content = tokens.rest()?.to_string();
        Ok(ServerMessage::Err {
            display_name,
            content,
        })
    } else if kind.eq_ignore_ascii_case("REPLY") {
        let result = tokens.next_token()?;
        let success = if result.eq_ignore_ascii_case("OK") {
            true
        } else if result.eq_ignore_ascii_case("NOK") {
            false
        } else {
            return Err(DecodeError::UnexpectedToken {
                expected: "OK|NOK",
                actual: result.to_string(),
            });
        };
        tokens.expect_keyword("IS")?;
        let content = tokens.rest()?.to_string();
        Ok(ServerMessage::Reply {
            success,
            ref_id: 0,
            content,
        })
    } else if kind.eq_ignore_ascii_case("BYE") {
        if !tokens.is_empty() {
            return Err(DecodeError::TrailingData);
        }
        Ok(ServerMessage::Bye)
    } else {
        Err(DecodeError::UnknownKind(kind.to_string()))
    }
}

/// Left-to-right tokenizer over one message line.
struct Tokens<'a> {
    remaining: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self { remaining: line }
    }

    fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Next space-delimited token.
    fn next_token(&mut self) -> Result<&'a str, DecodeError> {
        if self.remaining.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        match self.remaining.split_once(' ') {
            Some((token, rest)) => {
                self.remaining = rest;
                Ok(token)
            }
            None => {
                let token = self.remaining;
                self.remaining = "";
                Ok(token)
            }
        }
    }

    /// Consume a fixed keyword, case-insensitively.
    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), DecodeError> {
        let token = self.next_token()?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedToken {
                expected: keyword,
                actual: token.to_string(),
            })
        }
    }

    /// Everything left on the line (the content field). Must be non-empty.
    fn rest(&mut self) -> Result<&'a str, DecodeError> {
        if self.remaining.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        let rest = self.remaining;
        self.remaining = "";
        Ok(rest)
    }
}

/// Buffer that re-aligns stream reads to CRLF-terminated messages.
///
/// TCP reads are not message-aligned; bytes are accumulated here and complete
/// lines are handed out one at a time, with the terminator stripped. A line
/// longer than [`MAX_MESSAGE_SIZE`] fails instead of growing without bound.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_MESSAGE_SIZE),
        }
    }

    /// Append bytes read from the socket.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract the next complete line, if one is buffered.
    ///
    /// Returns `Ok(None)` while the line is still incomplete. Fails if the
    /// buffered prefix of an unterminated line already exceeds the maximum
    /// message size, or if a complete line is not valid UTF-8.
    pub fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        match find_crlf(&self.buffer) {
            Some(pos) => {
                let rest = self.buffer.split_off(pos + 2);
                let mut line = std::mem::replace(&mut self.buffer, rest);
                line.truncate(pos);
                if line.len() > MAX_MESSAGE_SIZE {
                    return Err(DecodeError::TooLong {
                        limit: MAX_MESSAGE_SIZE,
                        actual: line.len(),
                    });
                }
                match String::from_utf8(line) {
                    Ok(line) => Ok(Some(line)),
                    Err(bad) => Err(DecodeError::UnknownKind(
                        String::from_utf8_lossy(bad.as_bytes()).into_owned(),
                    )),
                }
            }
            None => {
                if self.buffer.len() > MAX_MESSAGE_SIZE {
                    return Err(DecodeError::TooLong {
                        limit: MAX_MESSAGE_SIZE,
                        actual: self.buffer.len(),
                    });
                }
                Ok(None)
            }
        }
    }
}

fn find_crlf(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_auth() {
        let message = ClientMessage::Auth {
            username: "alice".into(),
            display_name: "Alice".into(),
            secret: "pass123".into(),
        };
        assert_eq!(encode_stream(&message), "AUTH alice AS Alice USING pass123\r\n");
    }

    #[test]
    fn test_encode_join_msg_err_bye() {
        let join = ClientMessage::Join {
            channel_id: "general".into(),
            display_name: "Alice".into(),
        };
        assert_eq!(encode_stream(&join), "JOIN general AS Alice\r\n");

        let msg = ClientMessage::Msg {
            display_name: "Alice".into(),
            content: "hello there".into(),
        };
        assert_eq!(encode_stream(&msg), "MSG FROM Alice IS hello there\r\n");

        let err = ClientMessage::Err {
            display_name: "Alice".into(),
            content: "bad".into(),
        };
        assert_eq!(encode_stream(&err), "ERR FROM Alice IS bad\r\n");

        assert_eq!(encode_stream(&ClientMessage::Bye), "BYE\r\n");
    }

    #[test]
    fn test_decode_msg() {
        let decoded = decode_stream("MSG FROM Bob IS hello").unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Msg {
                display_name: "Bob".into(),
                content: "hello".into(),
            }
        );
    }

    #[test]
    fn test_decode_keywords_case_insensitive() {
        let decoded = decode_stream("msg from Bob is hello world").unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Msg {
                display_name: "Bob".into(),
                content: "hello world".into(),
            }
        );

        let decoded = decode_stream("reply ok IS welcome").unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Reply {
                success: true,
                ref_id: 0,
                content: "welcome".into(),
            }
        );
    }

    #[test]
    fn test_decode_reply_nok() {
        let decoded = decode_stream("REPLY NOK IS bad credentials").unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Reply {
                success: false,
                ref_id: 0,
                content: "bad credentials".into(),
            }
        );
    }

    #[test]
    fn test_decode_err() {
        let decoded = decode_stream("ERR FROM Server IS channel closed").unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Err {
                display_name: "Server".into(),
                content: "channel closed".into(),
            }
        );
    }

    #[test]
    fn test_decode_bye() {
        assert_eq!(decode_stream("BYE").unwrap(), ServerMessage::Bye);
        assert_eq!(decode_stream("bye").unwrap(), ServerMessage::Bye);

        // BYE with leftover content is not a valid BYE.
        assert!(matches!(
            decode_stream("BYE now"),
            Err(DecodeError::TrailingData)
        ));
    }

    #[test]
    fn test_decode_mismatched_keyword() {
        assert!(matches!(
            decode_stream("MSG TO Bob IS hello"),
            Err(DecodeError::UnexpectedToken {
                expected: "FROM",
                ..
            })
        ));
        assert!(matches!(
            decode_stream("REPLY MAYBE IS hm"),
            Err(DecodeError::UnexpectedToken {
                expected: "OK|NOK",
                ..
            })
        ));
    }

    #[test]
    fn test_decode_missing_field() {
        assert!(matches!(
            decode_stream("MSG FROM Bob IS"),
            Err(DecodeError::UnexpectedEof)
        ));
        assert!(matches!(
            decode_stream("MSG FROM"),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_decode_unknown_kind() {
        assert!(matches!(
            decode_stream("HELLO world"),
            Err(DecodeError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_stream_roundtrip() {
        // Client messages that the server grammar also accepts round-trip
        // through encode + decode.
        let msg = ClientMessage::Msg {
            display_name: "Alice".into(),
            content: "hi there, how are you".into(),
        };
        let line = encode_stream(&msg);
        let decoded = decode_stream(line.strip_suffix("\r\n").unwrap()).unwrap();
        assert_eq!(
            decoded,
            ServerMessage::Msg {
                display_name: "Alice".into(),
                content: "hi there, how are you".into(),
            }
        );
    }

    #[test]
    fn test_frame_buffer_splits_lines() {
        let mut framer = FrameBuffer::new();
        framer.push(b"MSG FROM Bob IS he");
        assert_eq!(framer.next_line().unwrap(), None);

        framer.push(b"llo\r\nBYE\r\n");
        assert_eq!(
            framer.next_line().unwrap(),
            Some("MSG FROM Bob IS hello".to_string())
        );
        assert_eq!(framer.next_line().unwrap(), Some("BYE".to_string()));
        assert_eq!(framer.next_line().unwrap(), None);
    }

    #[test]
    fn test_frame_buffer_oversized_line() {
        let mut framer = FrameBuffer::new();
        framer.push(&vec![b'a'; MAX_MESSAGE_SIZE + 1]);
        assert!(framer.next_line().is_err());
    }
}
