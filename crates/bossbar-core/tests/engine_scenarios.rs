//! Integration tests for the bar engine.
//!
//! These tests drive `SharedBossBar` and `DiverseBossBar` through the public
//! API only, recording every packet handed to the transport.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::cell::RefCell;
use std::collections::HashSet;

use bossbar_core::{
    BarColor, BarPacket, ClientId, DiverseBossBar, PacketKind, SharedBossBar, Transport,
    TransportError,
};

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Default)]
struct Recorder {
    sent: RefCell<Vec<(ClientId, BarPacket)>>,
    offline: RefCell<HashSet<ClientId>>,
}

impl Recorder {
    fn kinds_for(&self, client: ClientId) -> Vec<PacketKind> {
        self.sent
            .borrow()
            .iter()
            .filter(|(c, _)| *c == client)
            .map(|(_, p)| p.kind())
            .collect()
    }

    fn subscribers(bar: &SharedBossBar) -> HashSet<ClientId> {
        bar.subscribers().collect()
    }
}

impl Transport for Recorder {
    fn send(&self, client: ClientId, packet: BarPacket) -> Result<(), TransportError> {
        self.sent.borrow_mut().push((client, packet));
        Ok(())
    }

    fn is_connected(&self, client: ClientId) -> bool {
        !self.offline.borrow().contains(&client)
    }

    fn disconnect(&self, client: ClientId, _reason: &str) {
        self.offline.borrow_mut().insert(client);
    }
}

fn client(n: u64) -> ClientId {
    ClientId::new(n)
}

// ============================================================================
// Percentage
// ============================================================================

#[test]
fn test_percentage_is_clamped_for_any_input() {
    let transport = Recorder::default();
    let mut bar = SharedBossBar::new();

    let inputs = [
        -1000.0, -1.0, -0.0001, 0.0, 0.01, 0.25, 0.5, 0.75, 0.999, 1.0, 1.0001, 1.5, 42.0,
        f32::INFINITY, f32::NEG_INFINITY,
    ];
    for p in inputs {
        bar.set_percentage(&transport, p);
        let expected = p.clamp(0.0, 1.0);
        assert!(
            (bar.percentage() - expected).abs() < 1e-6,
            "set {p}, got {}",
            bar.percentage()
        );
    }
}

// ============================================================================
// Titles
// ============================================================================

#[test]
fn test_full_title_scenarios() {
    let transport = Recorder::default();
    let mut bar = SharedBossBar::new();

    bar.set_title(&transport, "Boss");
    bar.set_sub_title(&transport, "");
    assert_eq!(bar.full_title(), "Boss");

    bar.set_sub_title(&transport, "Phase 1");
    assert_eq!(bar.full_title(), "Boss\n\nPhase 1");

    for (t1, t2) in [("", ""), ("a", ""), ("", "b"), ("Ünïcödé", "✓ done")] {
        bar.set_title(&transport, t1);
        bar.set_sub_title(&transport, t2);
        let expected = if t2.is_empty() {
            t1.to_string()
        } else {
            format!("{t1}\n\n{t2}")
        };
        assert_eq!(bar.full_title(), expected);
    }
}

// ============================================================================
// Subscription
// ============================================================================

#[test]
fn test_double_add_is_idempotent() {
    let transport = Recorder::default();
    let mut once = SharedBossBar::new();
    let mut twice = SharedBossBar::new();

    once.add_player(&transport, client(1));
    twice.add_player(&transport, client(2));
    twice.add_player(&transport, client(2));

    assert_eq!(Recorder::subscribers(&once).len(), 1);
    assert_eq!(Recorder::subscribers(&twice).len(), 1);
    assert_eq!(transport.kinds_for(client(2)), vec![PacketKind::Show]);
}

#[test]
fn test_remove_non_subscriber_is_silent() {
    let transport = Recorder::default();
    let mut bar = SharedBossBar::new();
    bar.add_player(&transport, client(1));
    let before = Recorder::subscribers(&bar);

    bar.remove_player(&transport, client(9));

    assert_eq!(Recorder::subscribers(&bar), before);
    assert!(transport.kinds_for(client(9)).is_empty());
}

#[test]
fn test_show_then_health_sequence() {
    let transport = Recorder::default();
    let mut bar = SharedBossBar::new();

    bar.add_player(&transport, client(1));
    bar.set_percentage(&transport, 1.5);

    assert_eq!(bar.percentage(), 1.0);
    assert_eq!(
        transport.kinds_for(client(1)),
        vec![PacketKind::Show, PacketKind::HealthChanged]
    );
}

#[test]
fn test_disconnect_mid_roster_does_not_block_others() {
    let transport = Recorder::default();
    let mut bar = SharedBossBar::new();
    bar.add_players(&transport, [client(1), client(2), client(3)]);

    transport.disconnect(client(2), "gone");
    bar.set_title(&transport, "After");

    assert_eq!(
        transport.kinds_for(client(1)),
        vec![PacketKind::Show, PacketKind::TitleChanged]
    );
    assert_eq!(transport.kinds_for(client(2)), vec![PacketKind::Show]);
    assert_eq!(
        transport.kinds_for(client(3)),
        vec![PacketKind::Show, PacketKind::TitleChanged]
    );
}

// ============================================================================
// Diverse bars
// ============================================================================

#[test]
fn test_reset_restores_default_view() {
    let transport = Recorder::default();
    let mut bar = DiverseBossBar::new();
    bar.set_title(&transport, "Boss");
    bar.set_percentage(&transport, 0.8);
    bar.add_player(&transport, client(1));

    bar.set_title_for(&transport, [client(1)], "X");
    bar.set_percentage_for(&transport, [client(1)], 0.3);
    bar.reset_for(&transport, client(1));

    assert_eq!(bar.title_for(client(1)), bar.title());
    assert_eq!(bar.percentage_for(client(1)), bar.percentage());
}

#[test]
fn test_default_title_change_respects_overrides() {
    let transport = Recorder::default();
    let mut bar = DiverseBossBar::new();
    bar.set_title(&transport, "Original");
    bar.add_players(&transport, [client(1), client(2)]);
    bar.reset_for(&transport, client(2));

    bar.set_title(&transport, "Updated");

    assert_eq!(bar.title_for(client(1)), "Original");
    assert_eq!(bar.title_for(client(2)), "Updated");
}

#[test]
fn test_color_reset_scenario() {
    let transport = Recorder::default();
    let mut bar = DiverseBossBar::new();
    bar.add_player(&transport, client(1));

    bar.set_color_for(&transport, [client(1)], BarColor::Red);
    assert_eq!(bar.color_for(client(1)), BarColor::Red);

    bar.reset_for(&transport, client(1));
    assert_eq!(bar.color_for(client(1)), bar.color());
}

#[test]
fn test_no_orphan_overrides_after_removal() {
    let transport = Recorder::default();
    let mut bar = DiverseBossBar::new();
    bar.add_players(&transport, [client(1), client(2), client(3)]);
    bar.set_title_for(&transport, [client(1), client(2)], "custom");

    bar.remove_players(&transport, [client(1), client(3)]);
    assert_eq!(bar.override_count(), 1);
    assert!(bar.has_override(client(2)));

    bar.remove_all_players(&transport);
    assert_eq!(bar.override_count(), 0);
}
