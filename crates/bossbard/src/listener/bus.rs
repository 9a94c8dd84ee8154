//! Inbound message bus.
//!
//! Handlers subscribe to one top-level [`MessageKind`]. The kind filter is
//! applied before any handler runs, so a handler never sees messages of
//! another kind.

use bossbar_core::{ClientId, Transport};
use bossbar_protocol::{MessageKind, MessageType};
use tracing::trace;

/// What a handler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Message accepted, nothing else to do.
    Accepted,
    /// Message was not meant for this handler.
    Ignored,
    /// The originating client was disconnected.
    Disconnected,
}

/// A consumer of inbound client messages.
pub trait InboundHandler: Send {
    /// Stable name used to unsubscribe the handler.
    fn name(&self) -> &'static str;

    fn handle(
        &self,
        transport: &dyn Transport,
        client: ClientId,
        message: &MessageType,
    ) -> HandlerOutcome;
}

struct Subscription {
    kind: MessageKind,
    handler: Box<dyn InboundHandler>,
}

/// Result of dispatching one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Number of handlers invoked.
    pub invoked: usize,
    /// Whether a handler disconnected the client.
    pub disconnected: bool,
}

/// Routes inbound messages to the handlers subscribed to their kind.
#[derive(Default)]
pub struct MessageBus {
    subscriptions: Vec<Subscription>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: MessageKind, handler: Box<dyn InboundHandler>) {
        trace!(kind = ?kind, handler = handler.name(), "Handler subscribed");
        self.subscriptions.push(Subscription { kind, handler });
    }

    /// Removes every subscription of the named handler. Returns how many were removed.
    pub fn unsubscribe(&mut self, name: &str) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.handler.name() != name);
        before - self.subscriptions.len()
    }

    pub fn handler_count(&self, kind: MessageKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.subscriptions.iter().any(|s| s.handler.name() == name)
    }

    /// Delivers `message` to handlers of its kind, in subscription order.
    ///
    /// Stops early once a handler has disconnected the client.
    pub fn dispatch(
        &self,
        transport: &dyn Transport,
        client: ClientId,
        message: &MessageType,
    ) -> Dispatch {
        let kind = message.kind();
        let mut result = Dispatch::default();

        for sub in self.subscriptions.iter().filter(|s| s.kind == kind) {
            result.invoked += 1;
            if sub.handler.handle(transport, client, message) == HandlerOutcome::Disconnected {
                result.disconnected = true;
                break;
            }
        }

        if result.invoked == 0 {
            trace!(client = %client, kind = ?kind, "No handler for message kind");
        }
        result
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self
            .subscriptions
            .iter()
            .map(|s| (s.kind, s.handler.name()))
            .collect();
        f.debug_struct("MessageBus").field("subscriptions", &names).finish()
    }
}
