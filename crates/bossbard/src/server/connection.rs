//! One bar client on one socket.
//!
//! The handler reads a `Connect` line, checks the protocol version, then
//! attaches an outbound queue to the bar service. From then on a separate
//! writer task owns the socket's write half and the handler only reads:
//! pings are answered locally, boss events and chat text go to the bar
//! service's message bus. Bar packets, pongs and kicks all reach the
//! client through the same queue, so they arrive in the order they were
//! produced.
//!
//! The writer stops after flushing `Kicked` or `Rejected`, which cancels
//! the reader as well. Whatever ends the connection, the session is
//! detached from every bar before the handler returns.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use bossbar_core::ClientId;
use bossbar_protocol::{ClientMessage, MessageType, ProtocolVersion, ServerMessage};

use crate::bars::BarHandle;

/// How long a new client has to send `Connect`
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on flushing one line to a slow client
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Maximum size of one inbound line in bytes
    pub max_message_size: usize,
    /// Idle read timeout
    pub read_timeout: Duration,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_message_size: 65_536,
            read_timeout: Duration::from_secs(300),
        }
    }
}

type Writer = BufWriter<OwnedWriteHalf>;

/// Reader side of a bar client, plus the writer until the handshake ends.
pub struct ConnectionHandler {
    reader: BufReader<OwnedReadHalf>,

    /// Writer, handed to the writer task after the handshake
    writer: Option<Writer>,

    /// Handle to the bar service
    bars: BarHandle,

    /// Identifier assigned by the server
    client_id: ClientId,

    limits: ConnectionLimits,

    /// Cancelled on server shutdown or when the writer closes the session
    cancel_token: CancellationToken,
}

impl ConnectionHandler {
    /// `cancel_token` should be a child of the server's token.
    pub fn new(
        stream: UnixStream,
        bars: BarHandle,
        client_id: ClientId,
        limits: ConnectionLimits,
        cancel_token: CancellationToken,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer: Some(BufWriter::new(writer)),
            bars,
            client_id,
            limits,
            cancel_token,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Runs the connection until either side closes it.
    pub async fn run(mut self) {
        debug!(client = %self.client_id, "New client connected");

        let name = match self.handle_handshake().await {
            Ok(name) => name,
            Err(e) => {
                warn!(client = %self.client_id, error = %e, "Handshake failed");
                return;
            }
        };

        let Some(writer) = self.writer.take() else {
            return;
        };
        let (outbound, queue) = mpsc::unbounded_channel();

        // Queued first so it precedes anything the bar service sends.
        let _ = outbound.send(ServerMessage::connected(self.client_id));
        let writer_task = spawn_writer(writer, queue, self.client_id, self.cancel_token.clone());

        if let Err(e) = self
            .bars
            .attach(self.client_id, name.clone(), outbound.clone())
            .await
        {
            warn!(client = %self.client_id, error = %e, "Failed to attach session");
            let _ = outbound.send(ServerMessage::rejected(&e.to_string()));
            drop(outbound);
            let _ = timeout(WRITE_TIMEOUT, writer_task).await;
            return;
        }

        info!(client = %self.client_id, name = ?name, "Client handshake completed");

        if let Err(e) = self.process_messages(&outbound).await {
            debug!(client = %self.client_id, error = %e, "Client session ended");
        }

        let _ = self.bars.detach(self.client_id).await;
        drop(outbound);
        // Let the writer flush whatever is still queued.
        let _ = timeout(WRITE_TIMEOUT, writer_task).await;

        info!(client = %self.client_id, "Client disconnected");
    }

    /// Reads `Connect` and checks its version. Returns the client's name.
    async fn handle_handshake(&mut self) -> Result<Option<String>, ConnectionError> {
        let msg = match timeout(HANDSHAKE_TIMEOUT, self.read_message()).await {
            Ok(result) => result?,
            Err(_) => return Err(ConnectionError::Timeout),
        };

        let client_version = msg.protocol_version;
        if client_version.check().is_err() {
            warn!(
                client_version = %client_version,
                server_version = %ProtocolVersion::CURRENT,
                "Refusing client on another protocol version"
            );
            self.write_direct(&ServerMessage::rejected(&format!(
                "Protocol version {} not compatible with server version {}",
                client_version,
                ProtocolVersion::CURRENT
            )))
            .await?;
            return Err(ConnectionError::VersionMismatch {
                client: client_version,
                server: ProtocolVersion::CURRENT,
            });
        }

        match msg.message {
            MessageType::Connect { name } => Ok(name),
            other => {
                self.write_direct(&ServerMessage::error("Expected Connect message for handshake"))
                    .await?;
                Err(ConnectionError::UnexpectedMessage(format!("{:?}", other.kind())))
            }
        }
    }

    /// Reads client lines until disconnect, EOF, timeout or cancellation.
    async fn process_messages(
        &mut self,
        outbound: &mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), ConnectionError> {
        let token = self.cancel_token.clone();
        loop {
            let read = tokio::select! {
                _ = token.cancelled() => {
                    debug!(client = %self.client_id, "Connection cancelled");
                    return Ok(());
                }
                read = timeout(self.limits.read_timeout, self.read_message()) => read,
            };

            let msg = match read {
                Ok(Ok(msg)) => msg,
                Ok(Err(ConnectionError::Eof)) => {
                    debug!(client = %self.client_id, "Client sent EOF");
                    return Ok(());
                }
                Ok(Err(ConnectionError::ParseError(e))) => {
                    debug!(client = %self.client_id, error = %e, "Unparseable message");
                    let _ = outbound.send(ServerMessage::error_with_code(&e, "parse_error"));
                    continue;
                }
                Ok(Err(e)) => {
                    let _ = outbound.send(ServerMessage::error(&e.to_string()));
                    return Err(e);
                }
                Err(_) => {
                    debug!(client = %self.client_id, "Connection timed out");
                    return Err(ConnectionError::Timeout);
                }
            };

            if !self.handle_message(msg, outbound).await? {
                return Ok(());
            }
        }
    }

    /// Handles one message. Returns false when the client asked to disconnect.
    async fn handle_message(
        &mut self,
        msg: ClientMessage,
        outbound: &mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<bool, ConnectionError> {
        match msg.message {
            MessageType::Connect { .. } => {
                let _ = outbound.send(ServerMessage::error("Already connected"));
            }
            MessageType::Ping { seq } => {
                let _ = outbound.send(ServerMessage::pong(seq));
            }
            MessageType::Disconnect => {
                debug!(client = %self.client_id, "Client requested disconnect");
                return Ok(false);
            }
            message @ (MessageType::BossEvent { .. } | MessageType::Text { .. }) => {
                self.bars
                    .inbound(self.client_id, message)
                    .await
                    .map_err(|e| ConnectionError::Service(e.to_string()))?;
            }
        }
        Ok(true)
    }

    /// Reads one line of at most `max_message_size` bytes.
    async fn read_message(&mut self) -> Result<ClientMessage, ConnectionError> {
        let max = self.limits.max_message_size;
        let mut line = String::new();

        let bytes_read = (&mut self.reader)
            .take(max as u64 + 1)
            .read_line(&mut line)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ConnectionError::Eof);
        }

        if line.len() > max {
            return Err(ConnectionError::MessageTooLarge {
                size: line.len(),
                max,
            });
        }

        let msg: ClientMessage = serde_json::from_str(&line)
            .map_err(|e| ConnectionError::ParseError(e.to_string()))?;

        trace!(client = %self.client_id, kind = ?msg.kind(), "Received message");
        Ok(msg)
    }

    /// Writes a message before the writer task exists.
    async fn write_direct(&mut self, msg: &ServerMessage) -> Result<(), ConnectionError> {
        match self.writer.as_mut() {
            Some(writer) => write_line(writer, msg).await,
            None => Err(ConnectionError::Eof),
        }
    }
}

/// Spawns the task draining `queue` onto the socket.
///
/// The task ends when the queue closes, a write fails, or a terminal
/// message has been flushed. The last two cancel `cancel_token`.
fn spawn_writer(
    mut writer: Writer,
    mut queue: mpsc::UnboundedReceiver<ServerMessage>,
    client_id: ClientId,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = queue.recv().await {
            if let Err(e) = write_line(&mut writer, &msg).await {
                debug!(client = %client_id, error = %e, "Write failed");
                cancel_token.cancel();
                break;
            }
            if msg.is_terminal() {
                debug!(client = %client_id, "Terminal message sent, closing");
                cancel_token.cancel();
                break;
            }
        }
        let _ = writer.shutdown().await;
    })
}

/// Writes one JSON line with a timeout.
pub(crate) async fn write_line(writer: &mut Writer, msg: &ServerMessage) -> Result<(), ConnectionError> {
    let json = serde_json::to_string(msg).map_err(|e| ConnectionError::ParseError(e.to_string()))?;

    match timeout(WRITE_TIMEOUT, async {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    })
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
        Err(_) => Err(ConnectionError::WriteTimeout),
    }
}

/// Why a bar client's connection ended.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Protocol version mismatch: client {client}, server {server}")]
    VersionMismatch {
        client: ProtocolVersion,
        server: ProtocolVersion,
    },

    #[error("Expected connect, got {0}")]
    UnexpectedMessage(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Client closed the socket")]
    Eof,

    #[error("Read timeout")]
    Timeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Line of {size} bytes exceeds the {max} byte limit")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Bar service error: {0}")]
    Service(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::VersionMismatch {
            client: ProtocolVersion::new(2, 0),
            server: ProtocolVersion::new(1, 0),
        };
        assert!(err.to_string().contains("2.0"));
        assert!(err.to_string().contains("1.0"));
    }

    #[test]
    fn test_message_size_error() {
        let err = ConnectionError::MessageTooLarge {
            size: 70_000,
            max: ConnectionLimits::default().max_message_size,
        };
        assert!(err.to_string().contains("70000"));
        assert!(err.to_string().contains("65536"));
    }
}
