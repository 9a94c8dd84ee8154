//! Validation of client-originated boss events.
//!
//! Clients may only announce that they register or unregister for bar
//! updates. Any other boss event subtype coming from a client is a protocol
//! violation and ends its session.

use bossbar_core::{ClientId, Transport};
use bossbar_protocol::{BossEventType, MessageType};
use tracing::{debug, trace, warn};

use super::bus::{HandlerOutcome, InboundHandler};

/// Name the validator subscribes under.
pub const VALIDATOR_NAME: &str = "boss_event_validator";

/// Reason shown to a client kicked for a bad boss event.
pub const VIOLATION_REASON: &str = "Invalid packet received";

/// Classification of an inbound boss event subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Registration chatter, logged and otherwise ignored.
    Informational,
    /// Not something a client may send.
    Violation,
}

/// Handler enforcing the client boss event policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct BossEventValidator;

impl BossEventValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn verdict(event_type: BossEventType) -> Verdict {
        if event_type.is_client_originated() {
            Verdict::Informational
        } else {
            Verdict::Violation
        }
    }
}

impl InboundHandler for BossEventValidator {
    fn name(&self) -> &'static str {
        VALIDATOR_NAME
    }

    fn handle(
        &self,
        transport: &dyn Transport,
        client: ClientId,
        message: &MessageType,
    ) -> HandlerOutcome {
        let MessageType::BossEvent {
            event_type,
            player_id,
        } = message
        else {
            trace!(client = %client, "Validator skipped non boss event");
            return HandlerOutcome::Ignored;
        };

        match Self::verdict(*event_type) {
            Verdict::Informational => {
                debug!(
                    client = %client,
                    player_id = %player_id,
                    event_type = %event_type,
                    "Client boss event"
                );
                HandlerOutcome::Accepted
            }
            Verdict::Violation => {
                warn!(
                    client = %client,
                    event_type = %event_type,
                    code = event_type.code(),
                    "Client sent a server-only boss event"
                );
                transport.disconnect(client, VIOLATION_REASON);
                HandlerOutcome::Disconnected
            }
        }
    }
}
