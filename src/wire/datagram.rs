//! Binary codec for the datagram (UDP) transport grammar.
//!
//! Wire format:
//!
//! ```text
//! +--------+-----------------+----------------------------------------+
//! | Type   | Message ID      | Type-specific fields                   |
//! | 1 byte | 2 bytes (BE16)  | null-terminated strings, fixed order   |
//! +--------+-----------------+----------------------------------------+
//! ```
//!
//! For CONFIRM the ID field echoes the acknowledged message's ID. REPLY
//! carries a result byte and a big-endian referenced ID before its content
//! string. Encoding always produces exact, minimal-length buffers.

use crate::core::DecodeError;

use super::message::{ClientMessage, ServerMessage};

/// Size constants for the datagram grammar.
pub mod sizes {
    /// Fixed header: type tag + big-endian u16 message ID.
    pub const HEADER_SIZE: usize = 3;
    /// REPLY prefix before the content string: result byte + referenced ID.
    pub const REPLY_PREFIX_SIZE: usize = 3;
}

/// Message type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Acknowledgment of a received message.
    Confirm = 0x00,
    /// Result of an AUTH or JOIN request.
    Reply = 0x01,
    /// Authentication request.
    Auth = 0x02,
    /// Channel join request.
    Join = 0x03,
    /// Chat message.
    Msg = 0x04,
    /// Error report.
    Err = 0xFE,
    /// Graceful termination.
    Bye = 0xFF,
}

impl MessageType {
    /// Parse a type tag from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Confirm),
            0x01 => Some(Self::Reply),
            0x02 => Some(Self::Auth),
            0x03 => Some(Self::Join),
            0x04 => Some(Self::Msg),
            0xFE => Some(Self::Err),
            0xFF => Some(Self::Bye),
            _ => None,
        }
    }

    /// Convert the tag to its byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    /// CONFIRM: `ref_id` is the ID of the message being acknowledged.
    Confirm {
        /// Acknowledged message ID.
        ref_id: u16,
    },
    /// Any other message, with its own ID.
    Message {
        /// Sender-assigned message ID.
        id: u16,
        /// Decoded payload.
        message: ServerMessage,
    },
}

/// The fixed 3-byte header of any datagram.
///
/// The header is intentionally decodable on its own: a datagram whose body
/// is malformed must still be CONFIRMed by its ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    /// Raw type tag (may be outside the known set).
    pub tag: u8,
    /// Message ID (or acknowledged ID, for CONFIRM).
    pub id: u16,
}

impl DatagramHeader {
    /// Parse the header from a received buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < sizes::HEADER_SIZE {
            return Err(DecodeError::TooShort {
                expected: sizes::HEADER_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self {
            tag: data[0],
            id: u16::from_be_bytes([data[1], data[2]]),
        })
    }
}

/// Encode a CONFIRM acknowledging `ref_id`.
pub fn encode_confirm(ref_id: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(sizes::HEADER_SIZE);
    buf.push(MessageType::Confirm.as_byte());
    buf.extend_from_slice(&ref_id.to_be_bytes());
    buf
}

/// Encode a client message as a reliable datagram with the given ID.
pub fn encode_datagram(message: &ClientMessage, id: u16) -> Vec<u8> {
    let (tag, fields): (MessageType, Vec<&str>) = match message {
        ClientMessage::Auth {
            username,
            display_name,
            secret,
        } => (MessageType::Auth, vec![username, display_name, secret]),
        ClientMessage::Join {
            channel_id,
            display_name,
        } => (MessageType::Join, vec![channel_id, display_name]),
        ClientMessage::Msg {
            display_name,
            content,
        } => (MessageType::Msg, vec![display_name, content]),
        ClientMessage::Err {
            display_name,
            content,
        } => (MessageType::Err, vec![display_name, content]),
        ClientMessage::Bye => (MessageType::Bye, vec![]),
    };

    let body_len: usize = fields.iter().map(|f| f.len() + 1).sum();
    let mut buf = Vec::with_capacity(sizes::HEADER_SIZE + body_len);
    buf.push(tag.as_byte());
    buf.extend_from_slice(&id.to_be_bytes());
    for field in fields {
        buf.extend_from_slice(field.as_bytes());
        buf.push(0x00);
    }
    buf
}

/// Decode a received datagram.
///
/// Strict: a string field without a null terminator before buffer end fails
/// (the permissive read-to-boundary behavior would expose unrelated buffer
/// bytes as content), as do trailing bytes after the last field and a REPLY
/// result byte outside `{0, 1}`.
pub fn decode_datagram(data: &[u8]) -> Result<Datagram, DecodeError> {
    let header = DatagramHeader::from_bytes(data)?;
    let tag = MessageType::from_byte(header.tag)
        .ok_or_else(|| DecodeError::UnknownKind(format!("0x{:02x}", header.tag)))?;
    let body = &data[sizes::HEADER_SIZE..];

    match tag {
        MessageType::Confirm => {
            if !body.is_empty() {
                return Err(DecodeError::TrailingData);
            }
            Ok(Datagram::Confirm { ref_id: header.id })
        }
        MessageType::Bye => {
            if !body.is_empty() {
                return Err(DecodeError::TrailingData);
            }
            Ok(Datagram::Message {
                id: header.id,
                message: ServerMessage::Bye,
            })
        }
        MessageType::Reply => {
            if body.len() < sizes::REPLY_PREFIX_SIZE {
                return Err(DecodeError::TooShort {
                    expected: sizes::HEADER_SIZE + sizes::REPLY_PREFIX_SIZE,
                    actual: data.len(),
                });
            }
            let success = match body[0] {
                0 => false,
                1 => true,
                other => return Err(DecodeError::InvalidReplyResult(other)),
            };
            let ref_id = u16::from_be_bytes([body[1], body[2]]);
            let mut fields = FieldReader::new(&body[sizes::REPLY_PREFIX_SIZE..]);
            let content = fields.next_string()?;
            fields.finish()?;
            Ok(Datagram::Message {
                id: header.id,
                message: ServerMessage::Reply {
                    success,
                    ref_id,
                    content,
                },
            })
        }
        MessageType::Msg | MessageType::Err => {
            let mut fields = FieldReader::new(body);
            let display_name = fields.next_string()?;
            let content = fields.next_string()?;
            fields.finish()?;
            let message = if tag == MessageType::Msg {
                ServerMessage::Msg {
                    display_name,
                    content,
                }
            } else {
                ServerMessage::Err {
                    display_name,
                    content,
                }
            };
            Ok(Datagram::Message {
                id: header.id,
                message,
            })
        }
        // AUTH and JOIN are client-to-server only.
        MessageType::Auth | MessageType::Join => {
            Err(DecodeError::UnknownKind(format!("0x{:02x}", header.tag)))
        }
    }
}

/// Reads consecutive null-terminated string fields from a datagram body.
struct FieldReader<'a> {
    remaining: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { remaining: body }
    }

    fn next_string(&mut self) -> Result<String, DecodeError> {
        let end = self
            .remaining
            .iter()
            .position(|&b| b == 0x00)
            .ok_or(DecodeError::MissingTerminator)?;
        let field = &self.remaining[..end];
        self.remaining = &self.remaining[end + 1..];
        String::from_utf8(field.to_vec())
            .map_err(|_| DecodeError::UnknownKind(String::from_utf8_lossy(field).into_owned()))
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.remaining.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingData)
        }
    }
}
