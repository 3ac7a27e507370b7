//! Datagram (UDP) transport binding.
//!
//! Everything the stream binding gets from TCP is built here on top of the
//! reliability layer: every non-CONFIRM message carries an ID and is
//! retransmitted until CONFIRMed, at most one reliable message is in flight,
//! inbound duplicates are re-CONFIRMed but not re-processed, and the remote
//! port is adopted from the server's first response (the well-known port
//! only receives the initial AUTH; the session continues on a per-client
//! port).

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::core::{ClientError, MAX_MESSAGE_SIZE};
use crate::reliable::{CommandQueue, MessageIdCounter, PendingMessage, SeenIds, TimeoutVerdict};
use crate::session::{Command, Event, Session, SessionState};
use crate::wire::{
    ClientMessage, Datagram, DatagramHeader, MessageType, ServerMessage, decode_datagram,
    encode_confirm, encode_datagram,
};

use super::{ClientConfig, ConsoleEvent, ExitOutcome, split_actions};

/// Run one chat session over UDP. Returns when the session terminates.
pub async fn run_datagram(
    config: &ClientConfig,
    mut console: mpsc::Receiver<ConsoleEvent>,
) -> Result<ExitOutcome, ClientError> {
    let bind_addr = match config.server_addr {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
    info!(server = %config.server_addr, "socket ready");

    let mut runner = DatagramRunner {
        socket,
        remote: config.server_addr,
        port_adopted: false,
        session: Session::new(),
        ids: MessageIdCounter::new(),
        seen: SeenIds::new(),
        commands: CommandQueue::new(),
        outbox: VecDeque::new(),
        pending: None,
        expected_ref: None,
        confirm_timeout: config.confirm_timeout,
        max_retransmissions: config.max_retransmissions,
        outcome: None,
    };
    runner.run(&mut console).await
}

/// What one iteration of the select loop observed.
enum Step {
    Inbound(usize, SocketAddr),
    Console(Option<ConsoleEvent>),
    Deadline,
}

struct DatagramRunner {
    socket: UdpSocket,
    /// Where to send. Starts at the well-known port, then adopts the
    /// source of the server's first datagram.
    remote: SocketAddr,
    port_adopted: bool,
    session: Session,
    ids: MessageIdCounter,
    seen: SeenIds,
    /// User commands parked while a REPLY or CONFIRM is outstanding.
    commands: CommandQueue,
    /// Protocol-generated messages waiting for the in-flight slot.
    outbox: VecDeque<ClientMessage>,
    pending: Option<PendingMessage>,
    /// ID of the outstanding AUTH/JOIN a REPLY must reference.
    expected_ref: Option<u16>,
    confirm_timeout: Duration,
    max_retransmissions: u8,
    /// Decided exit code once the session started closing.
    outcome: Option<ExitOutcome>,
}

impl DatagramRunner {
    async fn run(
        &mut self,
        console: &mut mpsc::Receiver<ConsoleEvent>,
    ) -> Result<ExitOutcome, ClientError> {
        let mut buf = vec![0u8; MAX_MESSAGE_SIZE];

        loop {
            let deadline = self
                .pending
                .as_ref()
                .map(|p| Instant::from_std(p.deadline()))
                .unwrap_or_else(Instant::now);

            let step = tokio::select! {
                recv = self.socket.recv_from(&mut buf) => {
                    let (len, from) = recv?;
                    Step::Inbound(len, from)
                }
                maybe_event = console.recv(), if self.outcome.is_none() => {
                    Step::Console(maybe_event)
                }
                _ = sleep_until(deadline), if self.pending.is_some() => Step::Deadline,
            };

            match step {
                Step::Inbound(len, from) => {
                    if let Some(outcome) = self.handle_datagram(&buf[..len], from).await? {
                        return Ok(outcome);
                    }
                }
                Step::Console(Some(ConsoleEvent::Line(line))) => {
                    if !line.is_empty() {
                        self.handle_line(&line).await?;
                    }
                }
                Step::Console(Some(ConsoleEvent::Eof) | Some(ConsoleEvent::Interrupt) | None) => {
                    let sends = split_actions(self.session.shutdown());
                    self.outcome.get_or_insert(ExitOutcome::Graceful);
                    self.enqueue_all(sends).await?;
                    if let Some(outcome) = self.try_finish() {
                        return Ok(outcome);
                    }
                }
                Step::Deadline => self.on_deadline().await?,
            }
        }
    }

    /// One console line: local commands act immediately, network-bound ones
    /// go through the queue whenever the session cannot transmit right now.
    async fn handle_line(&mut self, line: &str) -> Result<(), ClientError> {
        match Command::parse(line) {
            Ok(command) => {
                let busy = self.session.awaiting_reply()
                    || self.pending.is_some()
                    || !self.commands.is_empty();
                if busy {
                    self.commands.push(command);
                } else {
                    let sends = split_actions(self.session.apply_command(command));
                    self.enqueue_all(sends).await?;
                }
            }
            Err(error) => {
                split_actions(self.session.reject_input(&error));
            }
        }
        Ok(())
    }

    async fn handle_datagram(
        &mut self,
        data: &[u8],
        from: SocketAddr,
    ) -> Result<Option<ExitOutcome>, ClientError> {
        if from.ip() != self.remote.ip() {
            debug!(%from, "datagram from unexpected source");
            return Ok(None);
        }
        if !self.port_adopted {
            self.remote = from;
            self.port_adopted = true;
        }

        match decode_datagram(data) {
            Ok(Datagram::Confirm { ref_id }) => {
                if self
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.is_confirmed_by(ref_id))
                {
                    self.pending = None;
                    self.pump().await?;
                } else {
                    debug!(ref_id, "stray confirm");
                }
                Ok(self.try_finish())
            }
            Ok(Datagram::Message { id, message }) => {
                // Confirm before anything else; the original CONFIRM may
                // have been lost and the peer is on its own retry clock.
                self.socket.send_to(&encode_confirm(id), self.remote).await?;
                if !self.seen.check_and_mark(id) {
                    debug!(id, "duplicate message");
                    return Ok(None);
                }
                let event = match message {
                    ServerMessage::Reply {
                        success,
                        ref_id,
                        content,
                    } => {
                        if self.expected_ref != Some(ref_id) {
                            // Confirmed above; a REPLY for a request we are
                            // not waiting on carries no further meaning.
                            debug!(ref_id, "REPLY references no outstanding request");
                            return Ok(self.try_finish());
                        }
                        self.expected_ref = None;
                        Event::Reply { success, content }
                    }
                    other => Event::from_message(other),
                };
                self.apply_event(event).await?;
                self.pump().await?;
                Ok(self.try_finish())
            }
            Err(error) => {
                debug!(%error, "malformed datagram");
                // A malformed datagram with a readable header still gets
                // its CONFIRM; the sender would retransmit forever otherwise.
                match DatagramHeader::from_bytes(data) {
                    Ok(header) if MessageType::from_byte(header.tag)
                        == Some(MessageType::Confirm) =>
                    {
                        return Ok(None);
                    }
                    Ok(header) => {
                        self.socket
                            .send_to(&encode_confirm(header.id), self.remote)
                            .await?;
                    }
                    Err(_) => {}
                }
                self.apply_event(Event::Unrecognized).await?;
                Ok(self.try_finish())
            }
        }
    }

    /// Feed one event to the session and record the resulting exit outcome.
    async fn apply_event(&mut self, event: Event) -> Result<(), ClientError> {
        let fatal_on_close = matches!(event, Event::ServerError { .. });
        let prior = self.session.state();
        let sends = split_actions(self.session.apply_event(event));
        self.enqueue_all(sends).await?;

        match self.session.state() {
            SessionState::ErrorReported => {
                // Queue the BYE behind the ERR; one-in-flight keeps order.
                let sends = split_actions(self.session.finish_error_report());
                self.enqueue_all(sends).await?;
                self.outcome.get_or_insert(ExitOutcome::Fatal);
            }
            SessionState::Closing if prior != SessionState::Closing => {
                self.outcome.get_or_insert(if fatal_on_close {
                    ExitOutcome::Fatal
                } else {
                    ExitOutcome::Graceful
                });
            }
            SessionState::Closed => {
                self.outcome.get_or_insert(ExitOutcome::Graceful);
            }
            _ => {}
        }
        Ok(())
    }

    /// Transmit a reliable message now or park it until the slot frees.
    async fn enqueue_all(&mut self, messages: Vec<ClientMessage>) -> Result<(), ClientError> {
        for message in messages {
            if self.pending.is_none() {
                self.transmit(message).await?;
            } else {
                self.outbox.push_back(message);
            }
        }
        Ok(())
    }

    /// Send one reliable message and arm its confirmation deadline.
    async fn transmit(&mut self, message: ClientMessage) -> Result<(), ClientError> {
        let id = self.ids.next();
        if matches!(
            message,
            ClientMessage::Auth { .. } | ClientMessage::Join { .. }
        ) {
            self.expected_ref = Some(id);
        }
        let payload = encode_datagram(&message, id);
        self.socket.send_to(&payload, self.remote).await?;
        self.pending = Some(PendingMessage::new(
            id,
            payload,
            self.max_retransmissions,
            self.confirm_timeout,
        ));
        Ok(())
    }

    /// Drain the outbox and the command queue while the slot is free.
    async fn pump(&mut self) -> Result<(), ClientError> {
        while self.pending.is_none() {
            if let Some(message) = self.outbox.pop_front() {
                self.transmit(message).await?;
                continue;
            }
            // User commands stay parked while a REPLY is outstanding or
            // the session is closing.
            if self.session.awaiting_reply() || self.outcome.is_some() {
                break;
            }
            match self.commands.pop() {
                Some(command) => {
                    let sends = split_actions(self.session.apply_command(command));
                    self.enqueue_all(sends).await?;
                }
                None => break,
            }
        }
        Ok(())
    }

    async fn on_deadline(&mut self) -> Result<(), ClientError> {
        let verdict = match self.pending.as_mut() {
            Some(pending) => pending.on_timeout(),
            None => return Ok(()),
        };
        match verdict {
            TimeoutVerdict::Retransmit => {
                if let Some(pending) = &self.pending {
                    debug!(
                        id = pending.id(),
                        remaining = pending.retries_remaining(),
                        "no confirmation, retransmitting"
                    );
                    let payload = pending.payload().to_vec();
                    self.socket.send_to(&payload, self.remote).await?;
                }
                Ok(())
            }
            TimeoutVerdict::GiveUp => Err(ClientError::RetransmitExhausted {
                retries: self.max_retransmissions,
            }),
        }
    }

    /// `Some` once nothing keeps the session alive.
    fn try_finish(&self) -> Option<ExitOutcome> {
        match self.session.state() {
            // Peer-initiated BYE ends the session immediately.
            SessionState::Closed => Some(self.outcome.unwrap_or(ExitOutcome::Graceful)),
            // Our own BYE (or ERR+BYE) must be confirmed first.
            SessionState::Closing if self.pending.is_none() && self.outbox.is_empty() => {
                Some(self.outcome.unwrap_or(ExitOutcome::Graceful))
            }
            _ => None,
        }
    }
}
