//! Inbound message handling.
//!
//! The `MessageBus` routes client messages by top-level kind. The
//! `BossEventValidator` is attached to it through a `ListenerRegistry`,
//! an explicit single-owner slot held by the bar service.

mod bus;
mod validator;

pub use bus::{Dispatch, HandlerOutcome, InboundHandler, MessageBus};
pub use validator::{BossEventValidator, Verdict, VALIDATOR_NAME, VIOLATION_REASON};

use bossbar_protocol::MessageKind;
use tracing::debug;

/// Single-owner registration slot for the boss event validator.
///
/// At most one validator is attached to the bus at a time. Registering
/// while the slot is taken is a silent no-op; unregistering always clears
/// the slot.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    registrant: Option<String>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the validator to `bus` on behalf of `owner`.
    ///
    /// Returns true if this call attached it.
    pub fn register(&mut self, owner: &str, bus: &mut MessageBus) -> bool {
        if let Some(current) = &self.registrant {
            debug!(owner = %owner, registrant = %current, "Validator already registered");
            return false;
        }

        bus.subscribe(MessageKind::BossEvent, Box::new(BossEventValidator::new()));
        self.registrant = Some(owner.to_string());
        debug!(owner = %owner, "Validator registered");
        true
    }

    /// Detaches the validator and clears the slot.
    pub fn unregister(&mut self, bus: &mut MessageBus) {
        bus.unsubscribe(VALIDATOR_NAME);
        if let Some(previous) = self.registrant.take() {
            debug!(owner = %previous, "Validator unregistered");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registrant.is_some()
    }

    pub fn registrant(&self) -> Option<&str> {
        self.registrant.as_deref()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{KickLog, LogCapture, NullTransport, VALIDATOR_TARGET};
    use super::*;
    use bossbar_core::{ClientId, EntityId};
    use bossbar_protocol::{BossEventType, MessageType};
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_register_is_idempotent() {
        let mut bus = MessageBus::new();
        let mut registry = ListenerRegistry::new();

        assert!(registry.register("bars", &mut bus));
        assert!(!registry.register("bars", &mut bus));
        assert!(!registry.register("other", &mut bus));

        assert_eq!(bus.handler_count(MessageKind::BossEvent), 1);
        assert_eq!(registry.registrant(), Some("bars"));
    }

    #[test]
    fn test_unregister_clears_slot_unconditionally() {
        let mut bus = MessageBus::new();
        let mut registry = ListenerRegistry::new();

        registry.unregister(&mut bus);
        assert!(!registry.is_registered());

        registry.register("bars", &mut bus);
        registry.unregister(&mut bus);
        assert!(!registry.is_registered());
        assert!(!bus.is_subscribed(VALIDATOR_NAME));

        assert!(registry.register("other", &mut bus));
        assert_eq!(registry.registrant(), Some("other"));
    }

    #[test]
    fn test_registration_event_does_not_disconnect() {
        let mut bus = MessageBus::new();
        let mut registry = ListenerRegistry::new();
        registry.register("bars", &mut bus);
        let kicks = KickLog::default();
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        let result = tracing::subscriber::with_default(subscriber, || {
            bus.dispatch(
                &kicks,
                ClientId::new(1),
                &MessageType::BossEvent {
                    event_type: BossEventType::RegisterPlayer,
                    player_id: EntityId::new(1),
                },
            )
        });

        assert_eq!(result.invoked, 1);
        assert!(!result.disconnected);
        assert!(kicks.kicked().is_empty());
        assert_eq!(
            capture.messages(Level::DEBUG, VALIDATOR_TARGET),
            vec!["Client boss event".to_string()]
        );
        assert_eq!(capture.count_from(VALIDATOR_TARGET), 1);
    }

    #[test]
    fn test_chat_message_never_reaches_validator() {
        let mut bus = MessageBus::new();
        let mut registry = ListenerRegistry::new();
        registry.register("bars", &mut bus);

        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        let result = tracing::subscriber::with_default(subscriber, || {
            bus.dispatch(
                &NullTransport,
                ClientId::new(1),
                &MessageType::Text {
                    message: "misrouted chat".to_string(),
                },
            )
        });

        assert_eq!(result.invoked, 0);
        assert_eq!(capture.count_from(VALIDATOR_TARGET), 0);
    }

    #[test]
    fn test_unregistered_validator_lets_anything_through() {
        let mut bus = MessageBus::new();
        let kicks = KickLog::default();

        let result = bus.dispatch(
            &kicks,
            ClientId::new(1),
            &MessageType::BossEvent {
                event_type: BossEventType::Show,
                player_id: EntityId::new(1),
            },
        );

        assert_eq!(result.invoked, 0);
        assert!(kicks.kicked().is_empty());
    }
}
