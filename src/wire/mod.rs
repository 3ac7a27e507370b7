//! Wire codecs for the two IPK24-CHAT transport grammars.
//!
//! Two independent grammars carry the same message set:
//!
//! - **Stream** (TCP): text, case-insensitive keywords, single-space field
//!   separators, CRLF-terminated lines.
//! - **Datagram** (UDP): binary, a 3-byte fixed header (type tag +
//!   big-endian u16 message ID) followed by null-terminated string fields
//!   in a fixed order.
//!
//! The codecs are pure function pairs: encode takes a typed message and
//! produces an exact, minimal-length buffer; decode takes bytes and produces
//! a typed message or a [`DecodeError`](crate::core::DecodeError). No I/O,
//! no state (except [`FrameBuffer`], which only re-aligns stream reads to
//! message boundaries).

mod datagram;
mod message;
mod stream;

pub use datagram::*;
pub use message::*;
pub use stream::*;
