//! Protocol constants for the IPK24-CHAT client.

use std::time::Duration;

/// Default server port when `-p` is not given.
pub const DEFAULT_SERVER_PORT: u16 = 4567;

/// Default UDP confirmation timeout when `-d` is not given.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_millis(250);

/// Default maximum number of UDP retransmissions when `-r` is not given.
pub const DEFAULT_MAX_RETRANSMISSIONS: u8 = 3;

/// Maximum size of a single protocol message on either transport.
///
/// Receive buffers in both bindings are sized to this; a stream line that
/// exceeds it is a protocol error rather than a partial read.
pub const MAX_MESSAGE_SIZE: usize = 1500;

/// Coarse receive timeout for the stream binding while a REPLY is awaited.
///
/// Used only to detect a dead connection; an idle established session waits
/// indefinitely.
pub const STREAM_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the console-line channel between the reader task and a binding.
pub const CONSOLE_CHANNEL_CAPACITY: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_SERVER_PORT, 4567);
        assert_eq!(DEFAULT_CONFIRM_TIMEOUT, Duration::from_millis(250));
        assert_eq!(DEFAULT_MAX_RETRANSMISSIONS, 3);
    }
}
