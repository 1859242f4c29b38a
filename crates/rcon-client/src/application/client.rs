//! RconClient: the public, cloneable handle to a running session.
//!
//! Architecture:
//! - `RconClient` sends requests (login, command, subscribe, disconnect) to
//!   a dedicated session task over an unbounded channel and awaits the reply
//!   on a `oneshot`.
//! - The session task owns the [`Session`] and multiplexes caller requests,
//!   inbound datagrams, the keepalive interval, and the login deadline with
//!   `tokio::select!`.  It is the only place the session is ever touched.
//! - Timers follow the session state: the login deadline exists exactly while
//!   a login is pending, the keepalive interval exactly while logged in.
//!
//! Requests are enqueued when the method is *called*, not when the returned
//! future is first polled, so two `login()` calls issued back to back reach
//! the session in that order.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::session::{
    CommandReply, ConnectionState, DisconnectReason, LoginReply, RconError, Session,
};
use crate::application::transport::Transport;

/// Default interval between keepalives.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(3000);

/// Default time to wait for the server to answer a login.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server RCON port.
    pub port: u16,
    /// RCON password.
    pub password: String,
    /// Interval between keepalives once logged in.
    pub keepalive_interval: Duration,
    /// How long to wait for the login response.
    pub login_timeout: Duration,
}

impl RconConfig {
    /// Creates a config with the default keepalive interval and login timeout.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }
}

/// Requests from a handle to the session task.
enum Request {
    Login(LoginReply),
    Command { command: String, reply: CommandReply },
    SubscribeMessages(mpsc::UnboundedSender<String>),
    SubscribeDisconnects(mpsc::UnboundedSender<DisconnectReason>),
    Disconnect(oneshot::Sender<()>),
}

/// Handle to a running RCON session.
///
/// Cheap to clone; every clone talks to the same session.  The session task
/// stops once the last handle is dropped.
#[derive(Clone)]
pub struct RconClient {
    requests: mpsc::UnboundedSender<Request>,
    state: watch::Receiver<ConnectionState>,
}

impl RconClient {
    /// Starts a session over `transport`, reading server datagrams from
    /// `inbound`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_transport<T>(
        transport: T,
        inbound: mpsc::Receiver<Vec<u8>>,
        config: RconConfig,
    ) -> Self
    where
        T: Transport + 'static,
    {
        let session = Session::new(transport, config.password);
        let state = session.watch_state();
        let (tx, rx) = mpsc::unbounded_channel();

        let driver = SessionDriver {
            session,
            requests: rx,
            inbound: Some(inbound),
            keepalive_period: config.keepalive_interval.max(Duration::from_millis(1)),
            login_timeout: config.login_timeout,
            keepalive: None,
            login_deadline: None,
        };
        tokio::spawn(driver.run());

        Self {
            requests: tx,
            state,
        }
    }

    /// Logs in with the configured password.
    ///
    /// Resolves to `Ok(true)` if the server accepted the password and
    /// `Ok(false)` if it rejected it.
    ///
    /// # Errors
    ///
    /// - [`RconError::LoginAlreadyInProgress`] / [`RconError::AlreadyConnected`]
    ///   immediately, without sending anything.
    /// - [`RconError::LoginTimeout`] if the server does not answer in time.
    pub fn login(&self) -> impl Future<Output = Result<bool, RconError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let queued = self.requests.send(Request::Login(tx)).is_ok();
        reply(queued, rx)
    }

    /// Sends a console command and resolves to the server's response.
    ///
    /// # Errors
    ///
    /// - [`RconError::NotConnected`] if the session is not logged in.
    /// - [`RconError::SequenceOverwritten`] if 256 newer commands were sent
    ///   before this one was answered.
    pub fn send_command(
        &self,
        command: impl Into<String>,
    ) -> impl Future<Output = Result<String, RconError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let queued = self
            .requests
            .send(Request::Command {
                command: command.into(),
                reply: tx,
            })
            .is_ok();
        reply(queued, rx)
    }

    /// Ends the session.  Resolves once the session is `Disconnected`.
    pub async fn disconnect(&self) {
        let (tx, rx) = oneshot::channel();
        if self.requests.send(Request::Disconnect(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Subscribes to messages pushed by the server.
    ///
    /// Messages are delivered in every connection state; each subscriber gets
    /// its own copy.
    pub fn subscribe_messages(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.requests.send(Request::SubscribeMessages(tx));
        rx
    }

    /// Subscribes to disconnect notifications.
    pub fn subscribe_disconnects(&self) -> mpsc::UnboundedReceiver<DisconnectReason> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.requests.send(Request::SubscribeDisconnects(tx));
        rx
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns a receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

async fn reply<T>(
    queued: bool,
    rx: oneshot::Receiver<Result<T, RconError>>,
) -> Result<T, RconError> {
    if !queued {
        return Err(RconError::Closed);
    }
    rx.await.map_err(|_| RconError::Closed)?
}

// ── Session task ──────────────────────────────────────────────────────────────

struct SessionDriver<T> {
    session: Session<T>,
    requests: mpsc::UnboundedReceiver<Request>,
    inbound: Option<mpsc::Receiver<Vec<u8>>>,
    keepalive_period: Duration,
    login_timeout: Duration,
    keepalive: Option<Interval>,
    login_deadline: Option<Instant>,
}

impl<T: Transport> SessionDriver<T> {
    async fn run(mut self) {
        debug!("session task started");
        loop {
            tokio::select! {
                biased;

                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
                datagram = recv_datagram(&mut self.inbound) => match datagram {
                    Some(datagram) => self.session.handle_datagram(&datagram).await,
                    None => {
                        warn!("transport receive channel closed");
                        self.inbound = None;
                    }
                },
                _ = sleep_until(self.login_deadline) => {
                    self.session.login_timed_out();
                }
                _ = tick(&mut self.keepalive) => {
                    self.session.keepalive_tick().await;
                }
            }
            self.sync_timers();
        }
        debug!("session task stopped");
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Login(reply) => self.session.begin_login(reply).await,
            Request::Command { command, reply } => {
                self.session.send_command(&command, reply).await
            }
            Request::SubscribeMessages(tx) => self.session.add_message_subscriber(tx),
            Request::SubscribeDisconnects(tx) => self.session.add_disconnect_subscriber(tx),
            Request::Disconnect(done) => {
                self.session.disconnect(DisconnectReason::Requested);
                let _ = done.send(());
            }
        }
    }

    /// Arms or cancels the timers to match the session state.
    fn sync_timers(&mut self) {
        if self.session.is_connected() {
            if self.keepalive.is_none() {
                info!(period = ?self.keepalive_period, "starting keepalive");
                let mut interval =
                    time::interval_at(Instant::now() + self.keepalive_period, self.keepalive_period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.keepalive = Some(interval);
            }
        } else if self.keepalive.take().is_some() {
            debug!("keepalive stopped");
        }

        if self.session.is_login_pending() {
            if self.login_deadline.is_none() {
                self.login_deadline = Some(Instant::now() + self.login_timeout);
            }
        } else {
            self.login_deadline = None;
        }
    }
}

async fn recv_datagram(inbound: &mut Option<mpsc::Receiver<Vec<u8>>>) -> Option<Vec<u8>> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rcon_config_defaults() {
        // Arrange / Act
        let config = RconConfig::new("127.0.0.1", 2306, "secret");

        // Assert
        assert_eq!(config.keepalive_interval, Duration::from_millis(3000));
        assert_eq!(config.login_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rcon_config_builders_override_timings() {
        // Arrange / Act
        let config = RconConfig::new("localhost", 2306, "secret")
            .with_keepalive_interval(Duration::from_millis(100))
            .with_login_timeout(Duration::from_millis(250));

        // Assert
        assert_eq!(config.keepalive_interval, Duration::from_millis(100));
        assert_eq!(config.login_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_requests_fail_with_closed_when_session_task_is_gone() {
        // Arrange – a handle whose request channel has no receiver
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let (_state_tx, state) = watch::channel(ConnectionState::Disconnected);
        let client = RconClient {
            requests: tx,
            state,
        };

        // Act
        let login = client.login().await;
        let command = client.send_command("players").await;

        // Assert
        assert!(matches!(login, Err(RconError::Closed)));
        assert!(matches!(command, Err(RconError::Closed)));
    }
}
