//! Per-client bar customisation.
//!
//! A [`DiverseBossBar`] is one bar whose title, subtitle, percentage and
//! color may differ for each subscriber. The plain [`BossBar`] setters
//! still change the defaults, which clients without an override see.

use tracing::debug;

use crate::{BarColor, BarPacket, BarStateResolver, BossBar, ClientId, PerClientResolver, Transport};

/// A bar with independent per-client state.
///
/// Subscribing a client copies the current defaults into its own override,
/// so later default changes do not reach it until [`BossBar::reset_for`]
/// is called.
pub type DiverseBossBar = BossBar<PerClientResolver>;

impl BossBar<PerClientResolver> {
    pub fn has_override(&self, client: ClientId) -> bool {
        self.resolver().has_override(client)
    }

    pub fn override_count(&self) -> usize {
        self.resolver().override_count()
    }

    pub fn title_for(&self, client: ClientId) -> &str {
        self.resolver().resolve(client).title()
    }

    pub fn set_title_for(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
        title: &str,
    ) {
        for client in clients {
            self.resolver_mut().override_mut(client).set_title(title);
            self.deliver(transport, client, self.title_packet(client));
        }
    }

    pub fn sub_title_for(&self, client: ClientId) -> &str {
        self.resolver().resolve(client).sub_title()
    }

    pub fn set_sub_title_for(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
        sub_title: &str,
    ) {
        for client in clients {
            self.resolver_mut().override_mut(client).set_sub_title(sub_title);
            self.deliver(transport, client, self.title_packet(client));
        }
    }

    /// Full title as displayed to `client`.
    ///
    /// Falls back to the default full title if the client's title and
    /// subtitle are both empty.
    pub fn full_title_for(&self, client: ClientId) -> String {
        self.resolver().full_title_for(client)
    }

    pub fn percentage_for(&self, client: ClientId) -> f32 {
        self.resolver().resolve(client).percentage()
    }

    /// Sets the percentage (clamped to `[0, 1]`) for `clients` only.
    pub fn set_percentage_for(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
        percentage: f32,
    ) {
        for client in clients {
            let state = self.resolver_mut().override_mut(client);
            state.set_percentage(percentage);
            let packet = BarPacket::health_changed(self.target_for(client), self.percentage_for(client));
            self.deliver(transport, client, packet);
        }
    }

    pub fn color_for(&self, client: ClientId) -> BarColor {
        self.resolver().resolve(client).color()
    }

    /// Sets the color for `clients` only and re-shows the bar to them.
    ///
    /// Subscribers the bar is hidden from get the new color on their next
    /// `show_to`.
    pub fn set_color_for(
        &mut self,
        transport: &impl Transport,
        clients: impl IntoIterator<Item = ClientId>,
        color: BarColor,
    ) {
        for client in clients {
            self.resolver_mut().override_mut(client).set_color(color);
            if !self.is_hidden(client) {
                self.deliver(transport, client, self.show_packet(client));
            }
        }
    }

    /// Drops `client`'s override and re-shows the default state to it,
    /// unless the bar is hidden from the client.
    pub fn reset_for(&mut self, transport: &impl Transport, client: ClientId) {
        if self.resolver_mut().clear(client) {
            debug!(client = %client, "Cleared per-client bar override");
        }
        if !self.is_hidden(client) {
            self.deliver(transport, client, self.show_packet(client));
        }
    }

    pub fn reset_for_all(&mut self, transport: &impl Transport) {
        let clients: Vec<ClientId> = self.subscribers().collect();
        for client in clients {
            self.reset_for(transport, client);
        }
    }
}
