//! Stream (TCP) transport binding.
//!
//! TCP already provides ordering and delivery, so this binding is thin:
//! frame inbound bytes into CRLF lines, decode, feed the session. The only
//! timer is a dead-connection guard armed while an AUTH/JOIN REPLY is
//! outstanding; an idle established session waits indefinitely.

use std::collections::VecDeque;

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::core::{ClientError, MAX_MESSAGE_SIZE, STREAM_REPLY_TIMEOUT};
use crate::session::{Command, Event, Session, SessionState};
use crate::wire::{ClientMessage, FrameBuffer, decode_stream, encode_stream};

use super::{ClientConfig, ConsoleEvent, ExitOutcome, split_actions};

/// Run one chat session over TCP. Returns when the session terminates.
pub async fn run_stream(
    config: &ClientConfig,
    mut console: mpsc::Receiver<ConsoleEvent>,
) -> Result<ExitOutcome, ClientError> {
    let stream = TcpStream::connect(config.server_addr)
        .await
        .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
    info!(addr = %config.server_addr, "connected");
    let (mut reader, mut writer) = stream.into_split();

    let mut session = Session::new();
    let mut frames = FrameBuffer::new();
    let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
    let mut reply_deadline: Option<Instant> = None;
    // Lines held back while a REPLY is outstanding. Shutdown events are
    // never held back; only command intake is deferred.
    let mut deferred: VecDeque<String> = VecDeque::new();

    loop {
        if !session.awaiting_reply() {
            reply_deadline = None;
            while !session.awaiting_reply() {
                let Some(line) = deferred.pop_front() else {
                    break;
                };
                submit_line(&mut session, &mut writer, &line).await?;
                if session.awaiting_reply() {
                    reply_deadline = Some(Instant::now() + STREAM_REPLY_TIMEOUT);
                }
            }
        }

        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    // Connection dropped without BYE; close our side anyway.
                    let sends = split_actions(session.apply_event(Event::Disconnect));
                    for message in sends {
                        let _ = writer.write_all(encode_stream(&message).as_bytes()).await;
                    }
                    return Ok(ExitOutcome::Graceful);
                }
                frames.push(&buf[..n]);
                loop {
                    let event = match frames.next_line() {
                        Ok(Some(line)) => match decode_stream(&line) {
                            Ok(message) => Event::from_message(message),
                            Err(error) => {
                                debug!(%error, "malformed line");
                                Event::Unrecognized
                            }
                        },
                        Ok(None) => break,
                        Err(error) => {
                            debug!(%error, "unframeable input");
                            Event::Unrecognized
                        }
                    };
                    if let Some(outcome) = dispatch(&mut session, &mut writer, event).await? {
                        return Ok(outcome);
                    }
                }
            }

            maybe_event = console.recv() => {
                match maybe_event {
                    Some(ConsoleEvent::Line(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        // Command intake is deferred while a REPLY is
                        // outstanding; the line waits for the gate to clear.
                        if session.awaiting_reply() {
                            deferred.push_back(line);
                            continue;
                        }
                        submit_line(&mut session, &mut writer, &line).await?;
                        if session.awaiting_reply() {
                            reply_deadline = Some(Instant::now() + STREAM_REPLY_TIMEOUT);
                        }
                    }
                    Some(ConsoleEvent::Eof) | Some(ConsoleEvent::Interrupt) | None => {
                        send_all(&mut writer, split_actions(session.shutdown())).await?;
                        session.mark_closed();
                        return Ok(ExitOutcome::Graceful);
                    }
                }
            }

            _ = sleep_until(reply_deadline.unwrap_or_else(Instant::now)),
                if reply_deadline.is_some() =>
            {
                return Err(ClientError::ReplyTimeout);
            }
        }
    }
}

/// Apply one inbound event; `Some` means the session is over.
async fn dispatch(
    session: &mut Session,
    writer: &mut OwnedWriteHalf,
    event: Event,
) -> Result<Option<ExitOutcome>, ClientError> {
    let fatal_on_close = matches!(event, Event::ServerError { .. });
    send_all(writer, split_actions(session.apply_event(event))).await?;

    match session.state() {
        SessionState::ErrorReported => {
            send_all(writer, split_actions(session.finish_error_report())).await?;
            session.mark_closed();
            Ok(Some(ExitOutcome::Fatal))
        }
        SessionState::Closing => {
            // BYE is on the wire; nothing left to wait for on a stream.
            session.mark_closed();
            Ok(Some(if fatal_on_close {
                ExitOutcome::Fatal
            } else {
                ExitOutcome::Graceful
            }))
        }
        SessionState::Closed => Ok(Some(ExitOutcome::Graceful)),
        _ => Ok(None),
    }
}

/// Parse and apply one console line.
async fn submit_line(
    session: &mut Session,
    writer: &mut OwnedWriteHalf,
    line: &str,
) -> Result<(), ClientError> {
    let actions = match Command::parse(line) {
        Ok(command) => session.apply_command(command),
        Err(error) => session.reject_input(&error),
    };
    send_all(writer, split_actions(actions)).await
}

async fn send_all(
    writer: &mut OwnedWriteHalf,
    messages: Vec<ClientMessage>,
) -> Result<(), ClientError> {
    for message in messages {
        writer.write_all(encode_stream(&message).as_bytes()).await?;
    }
    Ok(())
}
