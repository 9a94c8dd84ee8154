//! The boss bar synchronization engine.
//!
//! A [`BossBar`] owns a default [`BarState`] and a set of subscribed
//! clients. Every mutation immediately computes the affected messages from
//! current state and hands them to the [`Transport`].
//!
//! # Client states
//!
//! ```text
//!              add_player                 hide_from
//! Unsubscribed ──────────▶ Subscribed/Shown ───────▶ Subscribed/Hidden
//!      ▲                        │    ▲                    │
//!      │      remove_player     │    └──── show_to ───────┘
//!      └────────────────────────┘
//! ```
//!
//! Hiding keeps the subscription so that a later `show_to` resumes the bar
//! without re-adding the client. Color and anchor changes re-show the bar
//! only to subscribers that are not hidden.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, trace};

use crate::{
    Anchor, BarColor, BarPacket, BarState, BarStateResolver, ClientId, DomainError, DomainResult,
    EntityId, SharedResolver, Transport,
};

/// A bar that shows the same state to all of its subscribers.
pub type SharedBossBar = BossBar<SharedResolver>;

/// Boss bar shown to a roster of subscribed clients.
///
/// The resolver decides which state each client sees; see
/// [`crate::DiverseBossBar`] for the per-client variant.
#[derive(Debug, Clone, Default)]
pub struct BossBar<R: BarStateResolver = SharedResolver> {
    /// Dedicated target id. `None` addresses each client by its own id.
    anchor: Option<EntityId>,
    subscribers: HashSet<ClientId>,
    /// Subscribers the bar is currently hidden from.
    hidden: HashSet<ClientId>,
    resolver: R,
}

impl<R: BarStateResolver + Default> BossBar<R> {
    /// Creates a bar with no subscribers and no dedicated anchor.
    pub fn new() -> Self {
        Self::with_resolver(R::default())
    }

    /// Creates a bar addressed by a dedicated target id.
    pub fn with_anchor_id(id: impl Into<EntityId>) -> Self {
        Self {
            anchor: Some(id.into()),
            ..Self::new()
        }
    }
}

impl<R: BarStateResolver> BossBar<R> {
    /// Creates a bar around an existing resolver.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            anchor: None,
            subscribers: HashSet::new(),
            hidden: HashSet::new(),
            resolver,
        }
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    pub fn subscribers(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.subscribers.iter().copied()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, client: ClientId) -> bool {
        self.subscribers.contains(&client)
    }

    /// True if `client` is subscribed but the bar is hidden from it.
    pub fn is_hidden(&self, client: ClientId) -> bool {
        self.hidden.contains(&client)
    }

    /// Subscribes `client` and shows it the bar.
    ///
    /// Returns false (and sends nothing) if the client was already subscribed.
    pub fn add_player(&mut self, transport: &impl Transport, client: ClientId) -> bool {
        if self.subscribers.contains(&client) {
            return false;
        }
        self.resolver.on_subscribe(client);
        self.deliver(transport, client, self.show_packet(client));
        self.subscribers.insert(client);
        debug!(bar = %self, client = %client, "Client subscribed to bar");
        true
    }

    /// Subscribes each client in order. One failing client does not stop the rest.
    pub fn add_players(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
    ) {
        for client in clients {
            self.add_player(transport, client);
        }
    }

    /// Hides the bar from `client` and drops its subscription.
    ///
    /// Use [`BossBar::hide_from`] to hide temporarily without unsubscribing.
    /// Any per-client state is dropped even if the client was not
    /// subscribed. Returns false if the client was not subscribed.
    pub fn remove_player(&mut self, transport: &impl Transport, client: ClientId) -> bool {
        self.resolver.on_unsubscribe(client);
        if !self.subscribers.contains(&client) {
            debug!(
                bar = %self,
                client = %client,
                "Removed client that was not subscribed to the bar"
            );
            return false;
        }
        self.deliver(transport, client, BarPacket::hide(self.target_for(client)));
        self.subscribers.remove(&client);
        self.hidden.remove(&client);
        true
    }

    pub fn remove_players(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
    ) {
        for client in clients {
            self.remove_player(transport, client);
        }
    }

    /// Unsubscribes everyone and drops all per-client state.
    pub fn remove_all_players(&mut self, transport: &impl Transport) {
        let clients: Vec<ClientId> = self.subscribers.iter().copied().collect();
        self.remove_players(transport, clients);
        self.resolver.on_unsubscribe_all();
    }

    // ========================================================================
    // Default state
    // ========================================================================

    pub fn defaults(&self) -> &BarState {
        self.resolver.defaults()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub(crate) fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    /// Text above the bar.
    pub fn title(&self) -> &str {
        self.defaults().title()
    }

    /// Sets the text above the bar and notifies all subscribers.
    pub fn set_title(&mut self, transport: &impl Transport, title: impl Into<String>) {
        self.resolver.defaults_mut().set_title(title);
        self.broadcast_title(transport);
    }

    pub fn sub_title(&self) -> &str {
        self.defaults().sub_title()
    }

    /// Sets the optional text below the bar and notifies all subscribers.
    pub fn set_sub_title(&mut self, transport: &impl Transport, sub_title: impl Into<String>) {
        self.resolver.defaults_mut().set_sub_title(sub_title);
        self.broadcast_title(transport);
    }

    pub fn full_title(&self) -> String {
        self.defaults().full_title()
    }

    /// Fill percentage in `[0, 1]`.
    pub fn percentage(&self) -> f32 {
        self.defaults().percentage()
    }

    /// Sets the fill percentage (clamped to `[0, 1]`) and notifies all subscribers.
    pub fn set_percentage(&mut self, transport: &impl Transport, percentage: f32) {
        self.resolver.defaults_mut().set_percentage(percentage);
        for client in &self.subscribers {
            let percentage = self.resolver.resolve(*client).percentage();
            self.deliver(
                transport,
                *client,
                BarPacket::health_changed(self.target_for(*client), percentage),
            );
        }
    }

    pub fn color(&self) -> BarColor {
        self.defaults().color()
    }

    /// Sets the default color and re-shows the bar to visible subscribers.
    ///
    /// The protocol has no color-only update, so a full show is sent.
    pub fn set_color(&mut self, transport: &impl Transport, color: BarColor) {
        self.resolver.defaults_mut().set_color(color);
        self.reshow_visible(transport);
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Hides the bar from `clients` without unsubscribing them.
    ///
    /// Clients that are not subscribed still receive the hide message, but
    /// no bookkeeping changes.
    pub fn hide_from(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
    ) {
        for client in clients {
            self.deliver(transport, client, BarPacket::hide(self.target_for(client)));
            if self.subscribers.contains(&client) {
                self.hidden.insert(client);
            }
        }
    }

    pub fn hide_from_all(&mut self, transport: &impl Transport) {
        let clients: Vec<ClientId> = self.subscribers.iter().copied().collect();
        self.hide_from(transport, clients);
    }

    /// Shows the bar with its full current state to `clients`.
    pub fn show_to(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
    ) {
        for client in clients {
            self.hidden.remove(&client);
            self.deliver(transport, client, self.show_packet(client));
        }
    }

    pub fn show_to_all(&mut self, transport: &impl Transport) {
        let clients: Vec<ClientId> = self.subscribers.iter().copied().collect();
        self.show_to(transport, clients);
    }

    /// Re-sends a full show to subscribers the bar is not hidden from.
    fn reshow_visible(&self, transport: &impl Transport) {
        for client in self.visible_subscribers() {
            self.deliver(transport, client, self.show_packet(client));
        }
    }

    fn visible_subscribers(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.subscribers
            .iter()
            .copied()
            .filter(|client| !self.hidden.contains(client))
    }

    // ========================================================================
    // Anchor
    // ========================================================================

    /// The dedicated target id, if any.
    pub fn anchor_id(&self) -> Option<EntityId> {
        self.anchor
    }

    /// Attaches the bar to `anchor`, or detaches it with `None`.
    ///
    /// A closed or removal-flagged anchor is rejected and the bar is left
    /// unchanged. On success visible subscribers are moved to the new
    /// target id; hidden ones stay hidden until shown again.
    pub fn set_anchor(
        &mut self,
        transport: &impl Transport,
        anchor: Option<Anchor>,
    ) -> DomainResult<()> {
        if let Some(anchor) = &anchor {
            if anchor.is_closed() {
                return Err(DomainError::InvalidAnchor {
                    id: anchor.id(),
                    reason: "anchor is closed".to_string(),
                });
            }
            if anchor.is_flagged_for_removal() {
                return Err(DomainError::InvalidAnchor {
                    id: anchor.id(),
                    reason: "anchor is flagged for removal".to_string(),
                });
            }
        }

        let new_target = anchor.as_ref().map(Anchor::id);
        if let Some(health) = anchor.as_ref().and_then(Anchor::health) {
            self.resolver.defaults_mut().set_health(*health);
        }
        self.retarget(transport, new_target);
        Ok(())
    }

    /// Detaches the bar from its anchor so each client is addressed by its own id.
    pub fn reset_anchor(&mut self, transport: &impl Transport) {
        if self.anchor.is_none() {
            return;
        }
        self.retarget(transport, None);
    }

    /// Moves visible subscribers from the current target id to `target`.
    fn retarget(&mut self, transport: &impl Transport, target: Option<EntityId>) {
        for client in self.visible_subscribers() {
            self.deliver(transport, client, BarPacket::hide(self.target_for(client)));
        }
        self.anchor = target;
        debug!(bar = %self, "Bar anchor changed");
        self.reshow_visible(transport);
    }

    // ========================================================================
    // Message helpers
    // ========================================================================

    /// Target id used in messages to `client`.
    pub fn target_for(&self, client: ClientId) -> EntityId {
        self.anchor.unwrap_or_else(|| client.entity_id())
    }

    pub(crate) fn show_packet(&self, client: ClientId) -> BarPacket {
        BarPacket::show(
            self.target_for(client),
            self.resolver.full_title_for(client),
            self.resolver.resolve(client),
        )
    }

    pub(crate) fn title_packet(&self, client: ClientId) -> BarPacket {
        BarPacket::title_changed(self.target_for(client), self.resolver.full_title_for(client))
    }

    fn broadcast_title(&self, transport: &impl Transport) {
        for client in &self.subscribers {
            self.deliver(transport, *client, self.title_packet(*client));
        }
    }

    /// Sends one packet, skipping dead clients and logging failures.
    pub(crate) fn deliver(&self, transport: &impl Transport, client: ClientId, packet: BarPacket) {
        if !transport.is_connected(client) {
            trace!(client = %client, kind = ?packet.kind(), "Skipping disconnected client");
            return;
        }
        if let Err(e) = transport.send(client, packet) {
            debug!(client = %client, error = %e, "Failed to deliver bar packet");
        }
    }
}

impl<R: BarStateResolver> fmt::Display for BossBar<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self.anchor {
            Some(id) => id.to_string(),
            None => "self".to_string(),
        };
        let defaults = self.defaults();
        write!(
            f,
            "BossBar ID: {}, Players: {}, Title: \"{}\", Subtitle: \"{}\", Percentage: \"{}\"",
            id,
            self.subscribers.len(),
            defaults.title(),
            defaults.sub_title(),
            defaults.percentage()
        )?;
        let overrides = self.resolver.override_count();
        if overrides > 0 {
            write!(f, ", Overrides: {overrides}")?;
        }
        Ok(())
    }
}
