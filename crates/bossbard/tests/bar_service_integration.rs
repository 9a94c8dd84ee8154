//! Integration tests for the bar service actor.
//!
//! These tests drive the service through `BarHandle` only, with each
//! client's outbound queue standing in for a socket.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use bossbar_core::{Anchor, AttributeValue, BarColor, BarPacket, ClientId, EntityId, PacketKind};
use bossbar_protocol::{BossEventType, MessageType, ServerMessage};
use bossbard::bars::{spawn_bar_service, BarError, BarEvent, BarHandle, BarKind};
use bossbard::config::WelcomeBarConfig;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestClient {
    id: ClientId,
    queue: UnboundedReceiver<ServerMessage>,
}

impl TestClient {
    async fn attach(bars: &BarHandle, n: u64) -> Self {
        let (tx, queue) = mpsc::unbounded_channel();
        let id = ClientId::new(n);
        bars.attach(id, Some(format!("player{n}")), tx).await.unwrap();
        Self { id, queue }
    }

    fn drain(&mut self) -> Vec<ServerMessage> {
        std::iter::from_fn(|| self.queue.try_recv().ok()).collect()
    }

    fn packets(&mut self) -> Vec<BarPacket> {
        self.drain()
            .into_iter()
            .filter_map(|msg| match msg {
                ServerMessage::Bar { packet } => Some(packet),
                _ => None,
            })
            .collect()
    }

    fn kinds(&mut self) -> Vec<PacketKind> {
        self.packets().iter().map(BarPacket::kind).collect()
    }
}

fn service() -> BarHandle {
    spawn_bar_service(&WelcomeBarConfig::default())
}

/// Waits until all earlier fire-and-forget commands have been processed.
async fn sync(bars: &BarHandle) {
    bars.list_sessions().await;
}

// ============================================================================
// Bar lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_list_and_drop() {
    let bars = service();
    let mut events = bars.subscribe();

    let a = bars.create_bar(BarKind::Shared, None, "A").await.unwrap();
    let b = bars.create_bar(BarKind::Diverse, None, "B").await.unwrap();

    let listed: Vec<_> = bars.list_bars().await.iter().map(|s| (s.id, s.kind)).collect();
    assert_eq!(listed, vec![(a, BarKind::Shared), (b, BarKind::Diverse)]);

    bars.drop_bar(a).await.unwrap();
    assert!(bars.get_bar(a).await.is_none());
    assert_eq!(bars.drop_bar(a).await, Err(BarError::BarNotFound(a)));

    assert_eq!(
        events.recv().await.unwrap(),
        BarEvent::Created { bar_id: a, kind: BarKind::Shared }
    );
}

#[tokio::test]
async fn test_drop_hides_bar_from_subscribers() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "Boss").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();

    bars.drop_bar(bar).await.unwrap();

    assert_eq!(client.kinds(), vec![PacketKind::Show, PacketKind::Hide]);
}

// ============================================================================
// Shared bars
// ============================================================================

#[tokio::test]
async fn test_show_then_health_over_the_service() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "Boss").await.unwrap();

    bars.add_players(bar, vec![client.id]).await.unwrap();
    bars.set_percentage(bar, 1.5).await.unwrap();

    let packets = client.packets();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].kind(), PacketKind::Show);
    assert_eq!(
        packets[1],
        BarPacket::health_changed(client.id.entity_id(), 1.0)
    );
    assert_eq!(bars.get_bar(bar).await.unwrap().percentage, 1.0);
}

#[tokio::test]
async fn test_titles_reach_every_subscriber() {
    let bars = service();
    let mut one = TestClient::attach(&bars, 1).await;
    let mut two = TestClient::attach(&bars, 2).await;
    let bar = bars.create_bar(BarKind::Shared, None, "Boss").await.unwrap();
    bars.add_players(bar, vec![one.id, two.id]).await.unwrap();
    one.drain();
    two.drain();

    bars.set_sub_title(bar, "Phase 1").await.unwrap();

    for client in [&mut one, &mut two] {
        assert_eq!(
            client.packets(),
            vec![BarPacket::title_changed(
                client.id.entity_id(),
                "Boss\n\nPhase 1".to_string()
            )]
        );
    }
    assert_eq!(bars.get_bar(bar).await.unwrap().full_title, "Boss\n\nPhase 1");
}

#[tokio::test]
async fn test_hide_keeps_subscription() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();

    bars.hide_from_all(bar).await.unwrap();
    assert_eq!(bars.get_bar(bar).await.unwrap().subscribers, vec![client.id]);

    bars.show_to(bar, vec![client.id]).await.unwrap();
    assert_eq!(
        client.kinds(),
        vec![PacketKind::Show, PacketKind::Hide, PacketKind::Show]
    );
}

#[tokio::test]
async fn test_set_color_reshows() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();
    client.drain();

    bars.set_color(bar, BarColor::Purple).await.unwrap();

    match client.packets().as_slice() {
        [BarPacket::Show { color, .. }] => assert_eq!(*color, BarColor::Purple),
        other => panic!("expected one show, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_color_leaves_hidden_client_hidden() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();
    bars.hide_from(bar, vec![client.id]).await.unwrap();
    client.drain();

    bars.set_color(bar, BarColor::Red).await.unwrap();

    assert!(client.packets().is_empty());
    assert!(bars.client_view(bar, client.id).await.unwrap().hidden);

    bars.show_to_all(bar).await.unwrap();
    assert_eq!(client.kinds(), vec![PacketKind::Show]);
    assert!(!bars.client_view(bar, client.id).await.unwrap().hidden);
}

// ============================================================================
// Anchors
// ============================================================================

#[tokio::test]
async fn test_anchor_retargets_and_copies_health() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();
    client.drain();

    let anchor = Anchor::new(900u64).with_health(AttributeValue::with_value(25.0));
    bars.set_anchor(bar, Some(anchor)).await.unwrap();

    let packets = client.packets();
    assert_eq!(packets.first(), Some(&BarPacket::hide(client.id.entity_id())));
    assert_eq!(packets.last().map(BarPacket::target_id), Some(EntityId::new(900)));

    let snapshot = bars.get_bar(bar).await.unwrap();
    assert_eq!(snapshot.anchor_id, Some(EntityId::new(900)));
    assert!((snapshot.percentage - 0.25).abs() < 1e-6);
}

#[tokio::test]
async fn test_flagged_anchor_is_rejected() {
    let bars = service();
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();

    let err = bars
        .set_anchor(bar, Some(Anchor::new(5u64).flagged_for_removal()))
        .await
        .unwrap_err();

    assert!(matches!(err, BarError::InvalidAnchor(_)));
    assert_eq!(bars.get_bar(bar).await.unwrap().anchor_id, None);
}

// ============================================================================
// Diverse bars
// ============================================================================

#[tokio::test]
async fn test_per_client_views() {
    let bars = service();
    let mut one = TestClient::attach(&bars, 1).await;
    let two = TestClient::attach(&bars, 2).await;
    let bar = bars.create_bar(BarKind::Diverse, None, "Boss").await.unwrap();
    bars.add_players(bar, vec![one.id, two.id]).await.unwrap();
    one.drain();

    bars.set_title_for(bar, vec![one.id], "Your target").await.unwrap();
    bars.set_percentage_for(bar, vec![one.id], 0.3).await.unwrap();

    let view = bars.client_view(bar, one.id).await.unwrap();
    assert_eq!(view.title, "Your target");
    assert!((view.percentage - 0.3).abs() < 1e-6);
    assert!(view.has_override);

    let other = bars.client_view(bar, two.id).await.unwrap();
    assert_eq!(other.title, "Boss");

    assert_eq!(
        one.kinds(),
        vec![PacketKind::TitleChanged, PacketKind::HealthChanged]
    );
}

#[tokio::test]
async fn test_color_reset_reverts_to_default() {
    let bars = service();
    let client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Diverse, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();

    bars.set_color_for(bar, vec![client.id], BarColor::Red).await.unwrap();
    assert_eq!(bars.client_view(bar, client.id).await.unwrap().color, BarColor::Red);

    bars.reset_for(bar, client.id).await.unwrap();
    let view = bars.client_view(bar, client.id).await.unwrap();
    assert_eq!(view.color, bars.get_bar(bar).await.unwrap().color);
    assert!(!view.has_override);
}

#[tokio::test]
async fn test_per_client_ops_need_diverse_bar() {
    let bars = service();
    let bar = bars.create_bar(BarKind::Shared, None, "").await.unwrap();

    let err = bars
        .set_title_for(bar, vec![ClientId::new(1)], "x")
        .await
        .unwrap_err();

    assert!(matches!(err, BarError::WrongBarKind { .. }));
}

// ============================================================================
// Sessions and inbound traffic
// ============================================================================

#[tokio::test]
async fn test_detach_cleans_up_subscriptions() {
    let bars = service();
    let client = TestClient::attach(&bars, 1).await;
    let bar = bars.create_bar(BarKind::Diverse, None, "").await.unwrap();
    bars.add_players(bar, vec![client.id]).await.unwrap();

    bars.detach(client.id).await.unwrap();
    sync(&bars).await;

    let snapshot = bars.get_bar(bar).await.unwrap();
    assert!(snapshot.subscribers.is_empty());
    assert_eq!(snapshot.override_count, 0);
    assert!(bars.list_sessions().await.is_empty());
}

#[tokio::test]
async fn test_attach_twice_fails() {
    let bars = service();
    let _client = TestClient::attach(&bars, 1).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    assert_eq!(
        bars.attach(ClientId::new(1), None, tx).await,
        Err(BarError::AlreadyAttached(ClientId::new(1)))
    );
}

#[tokio::test]
async fn test_registration_event_is_harmless() {
    let bars = service();
    let mut client = TestClient::attach(&bars, 1).await;

    bars.inbound(
        client.id,
        MessageType::BossEvent {
            event_type: BossEventType::RegisterPlayer,
            player_id: client.id.entity_id(),
        },
    )
    .await
    .unwrap();
    sync(&bars).await;

    assert_eq!(bars.list_sessions().await.len(), 1);
    assert!(client.drain().is_empty());
}

#[tokio::test]
async fn test_server_only_event_kicks_client() {
    let bars = service();
    let mut events = bars.subscribe();
    let mut client = TestClient::attach(&bars, 7).await;

    bars.inbound(
        client.id,
        MessageType::BossEvent {
            event_type: BossEventType::HealthPercent,
            player_id: client.id.entity_id(),
        },
    )
    .await
    .unwrap();
    sync(&bars).await;

    assert_eq!(client.drain(), vec![ServerMessage::kicked("Invalid packet received")]);
    assert!(bars.list_sessions().await.is_empty());

    let mut kicked = false;
    while let Ok(event) = events.try_recv() {
        kicked |= event == BarEvent::Kicked { client_id: client.id };
    }
    assert!(kicked);
}

#[tokio::test]
async fn test_text_message_is_not_validated() {
    let bars = service();
    let client = TestClient::attach(&bars, 1).await;

    bars.inbound(client.id, MessageType::Text { message: "gg".to_string() })
        .await
        .unwrap();
    sync(&bars).await;

    assert_eq!(bars.list_sessions().await.len(), 1);
}

#[tokio::test]
async fn test_unregistered_validator_stops_kicking() {
    let bars = service();
    let client = TestClient::attach(&bars, 1).await;

    bars.unregister_validator().await.unwrap();
    bars.inbound(
        client.id,
        MessageType::BossEvent {
            event_type: BossEventType::Show,
            player_id: client.id.entity_id(),
        },
    )
    .await
    .unwrap();
    sync(&bars).await;
    assert_eq!(bars.list_sessions().await.len(), 1);

    assert!(bars.register_validator("tests").await.unwrap());
    assert!(!bars.register_validator("tests").await.unwrap());
}

#[tokio::test]
async fn test_welcome_bar() {
    let bars = spawn_bar_service(&WelcomeBarConfig {
        enabled: true,
        title: "Welcome".to_string(),
        sub_title: "to the server".to_string(),
        percentage: 0.5,
        color: BarColor::Blue,
        diverse: true,
    });

    let mut client = TestClient::attach(&bars, 1).await;

    let packets = client.packets();
    assert_eq!(
        packets,
        vec![BarPacket::Show {
            target_id: client.id.entity_id(),
            title: "Welcome\n\nto the server".to_string(),
            percentage: 0.5,
            color: BarColor::Blue,
            darken_screen: 1,
            overlay: 0,
        }]
    );

    let welcome = &bars.list_bars().await[0];
    assert_eq!(welcome.kind, BarKind::Diverse);
    assert_eq!(welcome.subscribers, vec![client.id]);
}
