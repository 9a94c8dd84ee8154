//! Strategies for resolving which state a client sees.
//!
//! A [`SharedResolver`] hands every client the same default state. A
//! [`PerClientResolver`] layers per-client overrides on top of it, falling
//! back to the defaults for clients without one.

use std::collections::HashMap;

use crate::{BarState, ClientId};

/// Resolves the effective [`BarState`] for each client of a bar.
pub trait BarStateResolver {
    /// The bar's default state.
    fn defaults(&self) -> &BarState;

    fn defaults_mut(&mut self) -> &mut BarState;

    /// The state `client` sees. Evaluated on every call.
    fn resolve(&self, client: ClientId) -> &BarState;

    /// Full title as displayed to `client`.
    fn full_title_for(&self, client: ClientId) -> String {
        self.resolve(client).full_title()
    }

    /// Called before `client` is added to the bar's subscribers.
    fn on_subscribe(&mut self, _client: ClientId) {}

    /// Called when `client` is removed from the bar's subscribers.
    fn on_unsubscribe(&mut self, _client: ClientId) {}

    /// Called once the bar has no subscribers left.
    fn on_unsubscribe_all(&mut self) {}

    /// Number of per-client overrides held.
    fn override_count(&self) -> usize {
        0
    }
}

// ============================================================================
// Shared
// ============================================================================

/// One state for every client.
#[derive(Debug, Clone, Default)]
pub struct SharedResolver {
    state: BarState,
}

impl SharedResolver {
    pub fn new(state: BarState) -> Self {
        Self { state }
    }
}

impl BarStateResolver for SharedResolver {
    fn defaults(&self) -> &BarState {
        &self.state
    }

    fn defaults_mut(&mut self) -> &mut BarState {
        &mut self.state
    }

    fn resolve(&self, _client: ClientId) -> &BarState {
        &self.state
    }
}

// ============================================================================
// Per-client
// ============================================================================

/// Default state plus independent per-client overrides.
///
/// Overrides are full copies of the default state taken when a client
/// subscribes (or is first customised), so later default changes do not
/// reach clients that already hold one.
#[derive(Debug, Clone, Default)]
pub struct PerClientResolver {
    base: SharedResolver,
    overrides: HashMap<ClientId, BarState>,
}

impl PerClientResolver {
    pub fn new(base: SharedResolver) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
        }
    }

    pub fn has_override(&self, client: ClientId) -> bool {
        self.overrides.contains_key(&client)
    }

    /// Returns `client`'s override, creating it from the defaults if absent.
    pub fn override_mut(&mut self, client: ClientId) -> &mut BarState {
        let defaults = self.base.defaults();
        self.overrides
            .entry(client)
            .or_insert_with(|| defaults.clone())
    }

    /// Drops `client`'s override. Returns true if one existed.
    pub fn clear(&mut self, client: ClientId) -> bool {
        self.overrides.remove(&client).is_some()
    }
}

impl BarStateResolver for PerClientResolver {
    fn defaults(&self) -> &BarState {
        self.base.defaults()
    }

    fn defaults_mut(&mut self) -> &mut BarState {
        self.base.defaults_mut()
    }

    fn resolve(&self, client: ClientId) -> &BarState {
        self.overrides
            .get(&client)
            .unwrap_or_else(|| self.base.resolve(client))
    }

    /// Falls back to the default full title when the client's own title
    /// and subtitle are both empty.
    fn full_title_for(&self, client: ClientId) -> String {
        let text = self.resolve(client).full_title();
        if text.is_empty() {
            self.defaults().full_title()
        } else {
            text
        }
    }

    fn on_subscribe(&mut self, client: ClientId) {
        let copy = self.base.defaults().clone();
        self.overrides.insert(client, copy);
    }

    fn on_unsubscribe(&mut self, client: ClientId) {
        self.overrides.remove(&client);
    }

    fn on_unsubscribe_all(&mut self) {
        self.overrides.clear();
    }

    fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(n: u64) -> ClientId {
        ClientId::new(n)
    }

    #[test]
    fn test_shared_resolves_defaults_for_everyone() {
        let mut resolver = SharedResolver::default();
        resolver.defaults_mut().set_title("Boss");
        assert_eq!(resolver.resolve(client(1)).title(), "Boss");
        assert_eq!(resolver.resolve(client(2)).title(), "Boss");
        assert_eq!(resolver.override_count(), 0);
    }

    #[test]
    fn test_per_client_falls_back_without_override() {
        let mut resolver = PerClientResolver::default();
        resolver.defaults_mut().set_title("Default");
        assert_eq!(resolver.resolve(client(1)).title(), "Default");

        resolver.defaults_mut().set_title("Changed");
        assert_eq!(resolver.resolve(client(1)).title(), "Changed");
    }

    #[test]
    fn test_subscribe_copies_defaults() {
        let mut resolver = PerClientResolver::default();
        resolver.defaults_mut().set_title("Before");
        resolver.on_subscribe(client(1));

        resolver.defaults_mut().set_title("After");
        assert_eq!(resolver.resolve(client(1)).title(), "Before");
        assert_eq!(resolver.resolve(client(2)).title(), "After");
    }

    #[test]
    fn test_unsubscribe_drops_override() {
        let mut resolver = PerClientResolver::default();
        resolver.on_subscribe(client(1));
        assert!(resolver.has_override(client(1)));
        resolver.on_unsubscribe(client(1));
        assert!(!resolver.has_override(client(1)));
        assert_eq!(resolver.override_count(), 0);
    }

    #[test]
    fn test_override_mut_creates_from_defaults() {
        let mut resolver = PerClientResolver::default();
        resolver.defaults_mut().set_sub_title("sub");
        resolver.override_mut(client(3)).set_title("Mine");

        let state = resolver.resolve(client(3));
        assert_eq!(state.title(), "Mine");
        assert_eq!(state.sub_title(), "sub");
    }

    #[test]
    fn test_full_title_fallback_when_empty() {
        let mut resolver = PerClientResolver::default();
        resolver.defaults_mut().set_title("Default");
        resolver.override_mut(client(1)).set_title("");

        assert_eq!(resolver.full_title_for(client(1)), "Default");
    }

    #[test]
    fn test_full_title_subtitle_only_override() {
        let mut resolver = PerClientResolver::default();
        resolver.defaults_mut().set_title("Default");
        let state = resolver.override_mut(client(1));
        state.set_title("");
        state.set_sub_title("Phase 2");

        assert_eq!(resolver.full_title_for(client(1)), "\n\nPhase 2");
    }
}
