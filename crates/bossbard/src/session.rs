//! Connected client sessions.
//!
//! The `SessionTable` maps each client to the outbound queue drained by its
//! connection's writer task. It is the daemon's [`Transport`]: the bar
//! engine sends through it without knowing about sockets.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - A closed queue is reported as `TransportError::Disconnected`

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use bossbar_core::{BarPacket, ClientId, Transport, TransportError};
use bossbar_protocol::ServerMessage;

/// Sender half of a client's outbound queue.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// A live client session.
#[derive(Debug)]
struct SessionEntry {
    sender: OutboundSender,
    connected_at: DateTime<Utc>,
    name: Option<String>,
}

/// Read-only view of a session for queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub client_id: ClientId,
    pub name: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Table of connected clients.
///
/// Owned by the bar actor and only touched from its task. Interior
/// mutability lets `disconnect` run through the `&self` transport API.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RefCell<HashMap<ClientId, SessionEntry>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session. Returns false if the client was already attached.
    pub fn attach(&self, client: ClientId, sender: OutboundSender, name: Option<String>) -> bool {
        let mut sessions = self.sessions.borrow_mut();
        if sessions.contains_key(&client) {
            return false;
        }
        sessions.insert(
            client,
            SessionEntry {
                sender,
                connected_at: Utc::now(),
                name,
            },
        );
        info!(client = %client, total = sessions.len(), "Session attached");
        true
    }

    /// Removes a session. Returns false if it was not attached.
    pub fn detach(&self, client: ClientId) -> bool {
        let removed = self.sessions.borrow_mut().remove(&client).is_some();
        if removed {
            info!(client = %client, "Session detached");
        }
        removed
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.sessions.borrow().contains_key(&client)
    }

    pub fn len(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.borrow().is_empty()
    }

    /// Queues a non-bar message, such as a pong or error, for `client`.
    pub fn send_message(&self, client: ClientId, message: ServerMessage) -> Result<(), TransportError> {
        let sessions = self.sessions.borrow();
        let entry = sessions
            .get(&client)
            .ok_or(TransportError::Disconnected(client))?;
        entry
            .sender
            .send(message)
            .map_err(|_| TransportError::Disconnected(client))
    }

    pub fn info(&self, client: ClientId) -> Option<SessionInfo> {
        self.sessions.borrow().get(&client).map(|entry| SessionInfo {
            client_id: client,
            name: entry.name.clone(),
            connected_at: entry.connected_at,
        })
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .sessions
            .borrow()
            .iter()
            .map(|(id, entry)| SessionInfo {
                client_id: *id,
                name: entry.name.clone(),
                connected_at: entry.connected_at,
            })
            .collect();
        infos.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then(a.client_id.cmp(&b.client_id))
        });
        infos
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.sessions.borrow().keys().copied().collect()
    }
}

impl Transport for SessionTable {
    fn send(&self, client: ClientId, packet: BarPacket) -> Result<(), TransportError> {
        self.send_message(client, ServerMessage::bar(packet))
    }

    fn is_connected(&self, client: ClientId) -> bool {
        self.sessions
            .borrow()
            .get(&client)
            .is_some_and(|entry| !entry.sender.is_closed())
    }

    fn disconnect(&self, client: ClientId, reason: &str) {
        let Some(entry) = self.sessions.borrow_mut().remove(&client) else {
            debug!(client = %client, "Disconnect requested for unknown session");
            return;
        };
        // The writer task closes the socket once this is flushed.
        let _ = entry.sender.send(ServerMessage::kicked(reason));
        info!(client = %client, reason = %reason, "Session kicked");
    }
}
