//! FIFO of user commands awaiting transmission.

use std::collections::VecDeque;

use crate::session::Command;

/// Ordered buffer of not-yet-dispatched user commands.
///
/// The datagram binding accepts console input at any time but may only have
/// one reliable message in flight; commands park here and are drained one at
/// a time, in issue order, whenever the in-flight slot is free.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command at the tail.
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Remove and return the oldest command.
    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Number of parked commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = CommandQueue::new();
        queue.push(Command::Rename {
            display_name: "a".into(),
        });
        queue.push(Command::Message {
            content: "hello".into(),
        });
        queue.push(Command::Message {
            content: "world".into(),
        });

        assert_eq!(queue.len(), 3);
        assert!(matches!(queue.pop(), Some(Command::Rename { .. })));
        assert_eq!(
            queue.pop(),
            Some(Command::Message {
                content: "hello".into()
            })
        );
        assert_eq!(
            queue.pop(),
            Some(Command::Message {
                content: "world".into()
            })
        );
        assert_eq!(queue.pop(), None);
    }
}
