//! Socket front end of the bar service.
//!
//! Every accepted stream becomes one bar client: it is given the next
//! [`ClientId`], handed to a [`ConnectionHandler`] on its own task, and
//! counted against `max_clients` until that task ends. Streams over the
//! limit get a `Rejected` line and are closed.
//!
//! ```text
//!  accept ──▶ ConnectionHandler ──attach/inbound──▶ BarHandle
//!                    ▲                                 │
//!                    └──── outbound ServerMessage ─────┘
//! ```
//!
//! A failed accept is logged and the loop keeps going. Cancelling the
//! token stops accepting, cancels every connection and unlinks the socket.

mod connection;

pub use connection::{
    ConnectionError, ConnectionHandler, ConnectionLimits, HANDSHAKE_TIMEOUT, WRITE_TIMEOUT,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::BufWriter;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bossbar_core::ClientId;
use bossbar_protocol::ServerMessage;

use crate::bars::BarHandle;
use crate::config::DaemonConfig;

/// Unix socket server for the bossbar daemon.
pub struct DaemonServer {
    socket_path: PathBuf,

    bars: BarHandle,

    /// Parent of every connection's token
    cancel_token: CancellationToken,

    /// Last client id handed out
    last_client_id: AtomicU64,

    /// Clients with a live handler task
    active: Arc<AtomicUsize>,

    max_clients: usize,

    limits: ConnectionLimits,
}

impl DaemonServer {
    /// Creates a new daemon server with default limits.
    pub fn new(
        socket_path: impl Into<PathBuf>,
        bars: BarHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        let defaults = DaemonConfig::default();
        Self {
            socket_path: socket_path.into(),
            bars,
            cancel_token,
            last_client_id: AtomicU64::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            max_clients: defaults.max_clients,
            limits: ConnectionLimits {
                max_message_size: defaults.max_message_size,
                read_timeout: defaults.read_timeout(),
            },
        }
    }

    /// Creates a server from a loaded configuration.
    pub fn from_config(
        config: &DaemonConfig,
        bars: BarHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self::new(config.socket_path.clone(), bars, cancel_token)
            .with_max_clients(config.max_clients)
            .with_limits(ConnectionLimits {
                max_message_size: config.max_message_size,
                read_timeout: config.read_timeout(),
            })
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    pub fn with_limits(mut self, limits: ConnectionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Number of currently open client connections.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Serves bar clients until the token is cancelled.
    pub async fn run(&self) -> Result<(), ServerError> {
        let setup_error = |e: std::io::Error| ServerError::SocketSetup {
            path: self.socket_path.clone(),
            error: e.to_string(),
        };

        // Left behind by a daemon that did not shut down cleanly.
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(setup_error)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(setup_error)?;
            }
        }

        let listener = UnixListener::bind(&self.socket_path).map_err(setup_error)?;

        info!(
            socket = %self.socket_path.display(),
            max_clients = self.max_clients,
            "Accepting bar clients"
        );

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Stopping bar client accept loop");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => self.handle_connection(stream),
                        Err(e) => {
                            error!(error = %e, "Accept failed");
                        }
                    }
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    /// Assigns a client id and starts the handler, or rejects when full.
    fn handle_connection(&self, stream: UnixStream) {
        let active = Arc::clone(&self.active);

        if active.load(Ordering::Relaxed) >= self.max_clients {
            warn!(max = self.max_clients, "Too many clients, rejecting connection");
            tokio::spawn(reject(stream, ServerError::TooManyClients { max: self.max_clients }));
            return;
        }

        let number = self.last_client_id.fetch_add(1, Ordering::Relaxed) + 1;
        let client_id = ClientId::new(number);
        let handler = ConnectionHandler::new(
            stream,
            self.bars.clone(),
            client_id,
            self.limits,
            self.cancel_token.child_token(),
        );

        let guard = ActiveGuard::new(active);
        tokio::spawn(async move {
            let _guard = guard;
            handler.run().await;
        });
    }

    /// Unlinks the socket.
    fn cleanup(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(
                    socket = %self.socket_path.display(),
                    error = %e,
                    "Could not unlink socket"
                );
            }
        }

        info!(socket = %self.socket_path.display(), "Socket unlinked");
    }
}

/// Counts a connection as active for as long as it lives.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Sends `Rejected` to a connection the server will not serve.
async fn reject(stream: UnixStream, reason: ServerError) {
    let (_reader, writer) = stream.into_split();
    let mut writer = BufWriter::new(writer);
    if let Err(e) = connection::write_line(&mut writer, &ServerMessage::rejected(&reason.to_string())).await {
        debug!(error = %e, "Failed to send rejection");
    }
}

/// Failures of the accept side of the daemon.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Cannot listen on {path}: {error}")]
    SocketSetup { path: PathBuf, error: String },

    #[error("Too many clients (max: {max})")]
    TooManyClients { max: usize },

    #[error("Client connection failed: {0}")]
    Connection(#[from] ConnectionError),
}
