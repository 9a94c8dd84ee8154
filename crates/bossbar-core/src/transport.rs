//! Delivery collaborator the engine sends its messages through.

use crate::{BarPacket, ClientId};
use thiserror::Error;

/// Per-client session transport provided by the hosting application.
///
/// Sending is fire-and-forget from the engine's point of view: a failed
/// send is logged and the engine moves on to the next client.
pub trait Transport {
    /// Queues `packet` for delivery to `client`.
    fn send(&self, client: ClientId, packet: BarPacket) -> Result<(), TransportError>;

    /// Returns true if `client` currently has a live session.
    fn is_connected(&self, client: ClientId) -> bool;

    /// Terminates `client`'s session with a reason shown to the client.
    fn disconnect(&self, client: ClientId, reason: &str);
}

/// Errors a transport may report for a single delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The client has no live session.
    #[error("client disconnected: {0}")]
    Disconnected(ClientId),

    /// The client's outbound queue refused the message.
    #[error("send to {client} failed: {reason}")]
    SendFailed { client: ClientId, reason: String },
}
