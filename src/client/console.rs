//! Console input as an async event stream.
//!
//! Stdin is read on a blocking task and forwarded over an mpsc channel, so
//! the binding loops can `select!` over console lines without a dedicated
//! async stdin abstraction. Ctrl-C arrives on the same channel.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

/// One unit of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// A full line, newline stripped.
    Line(String),
    /// Stdin reached end-of-input.
    Eof,
    /// The user pressed Ctrl-C.
    Interrupt,
}

/// Spawn the blocking stdin reader feeding `tx`.
///
/// The task terminates on end-of-input (after sending [`ConsoleEvent::Eof`])
/// or when the receiving binding is gone.
pub fn spawn_console_reader(tx: mpsc::Sender<ConsoleEvent>) {
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(ConsoleEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(error) => {
                    debug!(%error, "console read failed");
                    break;
                }
            }
        }
        let _ = tx.blocking_send(ConsoleEvent::Eof);
    });
}

/// Spawn the Ctrl-C listener feeding `tx`.
pub fn spawn_interrupt_listener(tx: mpsc::Sender<ConsoleEvent>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(ConsoleEvent::Interrupt).await;
        }
    });
}
