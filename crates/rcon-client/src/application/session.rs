//! Session: the connection state machine of one RCON client.
//!
//! The session owns everything that changes while talking to a server: the
//! connection state, the sequence counter, the table of commands awaiting a
//! response, partially reassembled responses, the pending login, and the
//! keepalive awaiting acknowledgement.  It is driven by exactly one task (see
//! [`crate::application::client`]), so none of this needs locking.
//!
//! # States
//!
//! ```text
//!                 login()                 Login(success)
//! Disconnected ───────────▶ LoggingIn ─────────────────────▶ Connected
//!      ▲                       │  Login(failure) / timeout      │   ▲
//!      │◀──────────────────────┘                                │   │ keepalive
//!      │                                          keepalive sent│   │ acked
//!      │        next tick with keepalive unacked                ▼   │
//!      └─────────────────────────────────────────── AwaitingKeepaliveAck
//! ```
//!
//! `disconnect()` returns to `Disconnected` from any state.  Server messages
//! are acknowledged and forwarded in every state.

use rcon_core::{
    protocol::packet::{
        command_packet, decode_packet, keepalive_packet, login_packet, message_ack_packet,
    },
    CommandBody, CorrelationTable, InboundPacket, ReassemblyBuffer, Responder, SequenceCounter,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

use crate::application::events::EventRegistry;
use crate::application::transport::Transport;

/// Errors surfaced to callers of login and command operations.
#[derive(Debug, Error)]
pub enum RconError {
    /// `login()` was called while an earlier login is still unanswered.
    #[error("a login is already in progress")]
    LoginAlreadyInProgress,

    /// `login()` was called on a session that is already logged in.
    #[error("already connected")]
    AlreadyConnected,

    /// The server did not answer the login within the login timeout.
    #[error("server did not respond to the login request")]
    LoginTimeout,

    /// A command was issued without a logged-in session.
    #[error("not connected")]
    NotConnected,

    /// The command's sequence number was handed to a newer command before
    /// any response arrived, so its response can no longer be told apart.
    #[error("sequence {0} was reused before a response arrived")]
    SequenceOverwritten(u8),

    /// The session was disconnected while the request was outstanding.
    #[error("session disconnected before the request completed")]
    Disconnected,

    /// The session task has stopped.
    #[error("client session has shut down")]
    Closed,

    /// The server host name could not be resolved.
    #[error("could not resolve server address {0}")]
    Resolve(String),

    /// The transport failed to send or bind.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    LoggingIn,
    Connected,
    /// Connected, with a keepalive sent and not yet acknowledged.
    AwaitingKeepaliveAck,
}

impl ConnectionState {
    /// `true` in both logged-in states.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::AwaitingKeepaliveAck
        )
    }
}

/// Why a logged-in session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The local side called `disconnect()`.
    Requested,
    /// A keepalive went unacknowledged for a full interval.
    ServerUnresponsive,
}

/// Reply channel for a login request.
pub type LoginReply = oneshot::Sender<Result<bool, RconError>>;

/// Reply channel for a command request.
pub type CommandReply = oneshot::Sender<Result<String, RconError>>;

/// A command caller waiting in the correlation table.
pub struct PendingCommand(CommandReply);

impl PendingCommand {
    fn fail(self, error: RconError) {
        let _ = self.0.send(Err(error));
    }
}

impl Responder for PendingCommand {
    fn respond(self, response: String) {
        // The caller may have stopped waiting; that is not an error here.
        let _ = self.0.send(Ok(response));
    }
}

/// Connection state machine for one server.
pub struct Session<T> {
    transport: T,
    password: String,
    state: watch::Sender<ConnectionState>,
    sequence: SequenceCounter,
    pending_commands: CorrelationTable<PendingCommand>,
    multipart: ReassemblyBuffer,
    pending_login: Option<LoginReply>,
    pending_keepalive: Option<u8>,
    messages: EventRegistry<String>,
    disconnects: EventRegistry<DisconnectReason>,
}

impl<T: Transport> Session<T> {
    /// Creates a disconnected session that will log in with `password`.
    pub fn new(transport: T, password: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            password: password.into(),
            state,
            sequence: SequenceCounter::new(),
            pending_commands: CorrelationTable::new(),
            multipart: ReassemblyBuffer::new(),
            pending_login: None,
            pending_keepalive: None,
            messages: EventRegistry::new(),
            disconnects: EventRegistry::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns a receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn is_login_pending(&self) -> bool {
        self.state() == ConnectionState::LoggingIn
    }

    /// Number of commands still waiting for a response.
    pub fn pending_commands(&self) -> usize {
        self.pending_commands.len()
    }

    /// Subscribes to server-pushed messages.
    pub fn subscribe_messages(&mut self) -> mpsc::UnboundedReceiver<String> {
        self.messages.subscribe()
    }

    /// Subscribes to disconnect notifications.
    pub fn subscribe_disconnects(&mut self) -> mpsc::UnboundedReceiver<DisconnectReason> {
        self.disconnects.subscribe()
    }

    pub fn add_message_subscriber(&mut self, subscriber: mpsc::UnboundedSender<String>) {
        self.messages.register(subscriber);
    }

    pub fn add_disconnect_subscriber(
        &mut self,
        subscriber: mpsc::UnboundedSender<DisconnectReason>,
    ) {
        self.disconnects.register(subscriber);
    }

    fn set_state(&mut self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(?previous, ?next, "connection state changed");
        }
    }

    // ── Caller requests ───────────────────────────────────────────────────────

    /// Sends the login packet and parks `reply` until the server answers.
    ///
    /// Rejected immediately, without sending anything, while another login is
    /// pending or the session is already logged in.
    pub async fn begin_login(&mut self, reply: LoginReply) {
        match self.state() {
            ConnectionState::LoggingIn => {
                let _ = reply.send(Err(RconError::LoginAlreadyInProgress));
                return;
            }
            ConnectionState::Connected | ConnectionState::AwaitingKeepaliveAck => {
                let _ = reply.send(Err(RconError::AlreadyConnected));
                return;
            }
            ConnectionState::Disconnected => {}
        }

        self.set_state(ConnectionState::LoggingIn);
        match self.transport.send(&login_packet(&self.password)).await {
            Ok(()) => {
                debug!("login packet sent");
                self.pending_login = Some(reply);
            }
            Err(e) => {
                warn!("failed to send login packet: {e}");
                self.set_state(ConnectionState::Disconnected);
                let _ = reply.send(Err(RconError::Io(e)));
            }
        }
    }

    /// Sends `command` under the next sequence number and parks `reply`
    /// until the matching response arrives.
    pub async fn send_command(&mut self, command: &str, reply: CommandReply) {
        if !self.is_connected() {
            let _ = reply.send(Err(RconError::NotConnected));
            return;
        }

        let sequence = self.sequence.next();
        if let Err(e) = self.transport.send(&command_packet(sequence, command)).await {
            warn!(sequence, "failed to send command: {e}");
            let _ = reply.send(Err(RconError::Io(e)));
            return;
        }

        trace!(sequence, command, "command sent");
        if let Some(displaced) = self
            .pending_commands
            .register(sequence, PendingCommand(reply))
        {
            displaced.fail(RconError::SequenceOverwritten(sequence));
        }
    }

    /// Ends the session from any state.
    ///
    /// A pending login is failed with [`RconError::Disconnected`].  Commands
    /// still awaiting a response stay registered; a late response will still
    /// reach them.
    pub fn disconnect(&mut self, reason: DisconnectReason) {
        let previous = self.state();
        self.set_state(ConnectionState::Disconnected);
        self.pending_keepalive = None;

        if let Some(reply) = self.pending_login.take() {
            let _ = reply.send(Err(RconError::Disconnected));
        }

        if previous != ConnectionState::Disconnected {
            info!(?reason, "disconnected");
            self.disconnects.publish(reason);
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    /// Called when the login timeout elapses.
    pub fn login_timed_out(&mut self) {
        if self.state() != ConnectionState::LoggingIn {
            return;
        }
        warn!("server did not answer the login request");
        self.set_state(ConnectionState::Disconnected);
        if let Some(reply) = self.pending_login.take() {
            let _ = reply.send(Err(RconError::LoginTimeout));
        }
    }

    /// Called on every keepalive interval while logged in.
    ///
    /// If the previous keepalive is still unacknowledged the server is
    /// considered gone and the session disconnects; otherwise a new
    /// keepalive is sent.
    pub async fn keepalive_tick(&mut self) {
        if !self.is_connected() {
            return;
        }

        if let Some(sequence) = self.pending_keepalive {
            warn!(sequence, "keepalive was not acknowledged");
            self.disconnect(DisconnectReason::ServerUnresponsive);
            return;
        }

        let sequence = self.sequence.next();
        // A keepalive that failed to send still counts as unacknowledged.
        if let Err(e) = self.transport.send(&keepalive_packet(sequence)).await {
            warn!(sequence, "failed to send keepalive: {e}");
        }
        self.pending_keepalive = Some(sequence);
        self.set_state(ConnectionState::AwaitingKeepaliveAck);
    }

    // ── Inbound dispatch ──────────────────────────────────────────────────────

    /// Validates and dispatches one datagram received from the server.
    ///
    /// Datagrams that fail frame validation are dropped here and never
    /// reported further.
    pub async fn handle_datagram(&mut self, datagram: &[u8]) {
        let packet = match decode_packet(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(len = datagram.len(), "dropping inbound datagram: {e}");
                return;
            }
        };

        match packet {
            InboundPacket::Login { success } => self.finish_login(success),
            InboundPacket::Command { sequence, body } => self.handle_command(sequence, body),
            InboundPacket::Message { sequence, text } => self.handle_message(sequence, text).await,
        }
    }

    fn finish_login(&mut self, success: bool) {
        if self.state() != ConnectionState::LoggingIn {
            debug!(success, "ignoring login response outside of a login attempt");
            return;
        }

        if success {
            info!("logged in");
            self.set_state(ConnectionState::Connected);
        } else {
            warn!("server rejected the login password");
            self.set_state(ConnectionState::Disconnected);
        }
        self.pending_keepalive = None;

        if let Some(reply) = self.pending_login.take() {
            let _ = reply.send(Ok(success));
        }
    }

    fn handle_command(&mut self, sequence: u8, body: CommandBody) {
        match body {
            CommandBody::Empty if self.pending_keepalive == Some(sequence) => {
                trace!(sequence, "keepalive acknowledged");
                self.pending_keepalive = None;
                if self.state() == ConnectionState::AwaitingKeepaliveAck {
                    self.set_state(ConnectionState::Connected);
                }
            }
            CommandBody::Empty => self.resolve(sequence, String::new()),
            CommandBody::Text(text) => self.resolve(sequence, text),
            CommandBody::Fragment { total, index, data } => {
                if index == 0 && self.multipart.is_assembling(sequence) {
                    warn!(sequence, "dropping incomplete multipart response");
                }
                if let Some(bytes) = self.multipart.push(sequence, total, index, &data) {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if !self.pending_commands.resolve(sequence, text) {
                        warn!(sequence, "discarding multipart response nobody is waiting for");
                    }
                }
            }
        }
    }

    fn resolve(&mut self, sequence: u8, text: String) {
        if !self.pending_commands.resolve(sequence, text) {
            debug!(sequence, "response for a sequence nobody is waiting for");
        }
    }

    async fn handle_message(&mut self, sequence: u8, text: String) {
        if let Err(e) = self.transport.send(&message_ack_packet(sequence)).await {
            warn!(sequence, "failed to acknowledge server message: {e}");
        }
        trace!(sequence, "server message: {text}");
        self.messages.publish(text);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
