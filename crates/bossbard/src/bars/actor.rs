//! Bar actor - owns every bar and client session and processes commands.
//!
//! The BarActor is the single owner of bar state in the daemon. It receives
//! commands via an mpsc channel, applies them to the bar engine with the
//! session table as transport, and publishes lifecycle events via broadcast.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::collections::BTreeMap;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use bossbar_core::{
    BarStateResolver, BossBar, ClientId, DiverseBossBar, EntityId, SharedBossBar,
};
use bossbar_protocol::MessageType;

use super::commands::{
    BarCommand, BarError, BarEvent, BarId, BarKind, BarOp, BarSnapshot, ClientView,
};
use crate::config::WelcomeBarConfig;
use crate::listener::{ListenerRegistry, MessageBus};
use crate::session::{OutboundSender, SessionTable};

// ============================================================================
// Resource Limits
// ============================================================================

/// Maximum number of bars the service can hold.
pub const MAX_BARS: usize = 256;

/// Owner name the actor registers the boss event validator under.
pub const VALIDATOR_OWNER: &str = "bar-service";

// ============================================================================
// Managed Bars
// ============================================================================

/// A bar of either kind owned by the actor.
#[derive(Debug)]
enum ManagedBar {
    Shared(SharedBossBar),
    Diverse(DiverseBossBar),
}

impl ManagedBar {
    fn kind(&self) -> BarKind {
        match self {
            Self::Shared(_) => BarKind::Shared,
            Self::Diverse(_) => BarKind::Diverse,
        }
    }

    fn apply(&mut self, bar_id: BarId, sessions: &SessionTable, op: BarOp) -> Result<(), BarError> {
        match self {
            Self::Shared(bar) => apply_common(bar_id, BarKind::Shared, bar, sessions, op),
            Self::Diverse(bar) => apply_diverse(bar_id, bar, sessions, op),
        }
    }

    fn remove_player(&mut self, sessions: &SessionTable, client: ClientId) -> bool {
        match self {
            Self::Shared(bar) => bar.remove_player(sessions, client),
            Self::Diverse(bar) => bar.remove_player(sessions, client),
        }
    }

    fn add_player(&mut self, sessions: &SessionTable, client: ClientId) -> bool {
        match self {
            Self::Shared(bar) => bar.add_player(sessions, client),
            Self::Diverse(bar) => bar.add_player(sessions, client),
        }
    }

    fn remove_all_players(&mut self, sessions: &SessionTable) {
        match self {
            Self::Shared(bar) => bar.remove_all_players(sessions),
            Self::Diverse(bar) => bar.remove_all_players(sessions),
        }
    }

    fn snapshot(&self, id: BarId) -> BarSnapshot {
        match self {
            Self::Shared(bar) => snapshot_of(id, BarKind::Shared, bar),
            Self::Diverse(bar) => snapshot_of(id, BarKind::Diverse, bar),
        }
    }

    fn client_view(&self, client: ClientId) -> ClientView {
        match self {
            Self::Shared(bar) => view_of(bar, client, false),
            Self::Diverse(bar) => view_of(bar, client, bar.has_override(client)),
        }
    }
}

/// Applies an operation every bar kind supports.
fn apply_common<R: BarStateResolver>(
    bar_id: BarId,
    kind: BarKind,
    bar: &mut BossBar<R>,
    sessions: &SessionTable,
    op: BarOp,
) -> Result<(), BarError> {
    match op {
        BarOp::AddPlayers(clients) => bar.add_players(sessions, clients),
        BarOp::RemovePlayers(clients) => bar.remove_players(sessions, clients),
        BarOp::RemoveAllPlayers => bar.remove_all_players(sessions),
        BarOp::SetTitle(title) => bar.set_title(sessions, title),
        BarOp::SetSubTitle(sub_title) => bar.set_sub_title(sessions, sub_title),
        BarOp::SetPercentage(percentage) => bar.set_percentage(sessions, percentage),
        BarOp::SetColor(color) => bar.set_color(sessions, color),
        BarOp::HideFrom(clients) => bar.hide_from(sessions, clients),
        BarOp::HideFromAll => bar.hide_from_all(sessions),
        BarOp::ShowTo(clients) => bar.show_to(sessions, clients),
        BarOp::ShowToAll => bar.show_to_all(sessions),
        BarOp::SetAnchor(anchor) => bar.set_anchor(sessions, anchor)?,
        per_client => {
            return Err(BarError::WrongBarKind {
                bar_id,
                kind,
                op: per_client.name(),
            })
        }
    }
    Ok(())
}

/// Applies an operation to a diverse bar, including per-client ones.
fn apply_diverse(
    bar_id: BarId,
    bar: &mut DiverseBossBar,
    sessions: &SessionTable,
    op: BarOp,
) -> Result<(), BarError> {
    match op {
        BarOp::SetTitleFor(clients, title) => bar.set_title_for(sessions, clients, &title),
        BarOp::SetSubTitleFor(clients, sub_title) => {
            bar.set_sub_title_for(sessions, clients, &sub_title)
        }
        BarOp::SetPercentageFor(clients, percentage) => {
            bar.set_percentage_for(sessions, clients, percentage)
        }
        BarOp::SetColorFor(clients, color) => bar.set_color_for(sessions, clients, color),
        BarOp::ResetFor(client) => bar.reset_for(sessions, client),
        BarOp::ResetForAll => bar.reset_for_all(sessions),
        common => return apply_common(bar_id, BarKind::Diverse, bar, sessions, common),
    }
    Ok(())
}

fn snapshot_of<R: BarStateResolver>(id: BarId, kind: BarKind, bar: &BossBar<R>) -> BarSnapshot {
    let mut subscribers: Vec<ClientId> = bar.subscribers().collect();
    subscribers.sort();
    BarSnapshot {
        id,
        kind,
        anchor_id: bar.anchor_id(),
        title: bar.title().to_string(),
        sub_title: bar.sub_title().to_string(),
        full_title: bar.full_title(),
        percentage: bar.percentage(),
        color: bar.color(),
        subscribers,
        override_count: bar.resolver().override_count(),
        summary: bar.to_string(),
    }
}

fn view_of<R: BarStateResolver>(bar: &BossBar<R>, client: ClientId, has_override: bool) -> ClientView {
    let state = bar.resolver().resolve(client);
    ClientView {
        subscribed: bar.is_subscribed(client),
        hidden: bar.is_hidden(client),
        has_override,
        title: state.title().to_string(),
        sub_title: state.sub_title().to_string(),
        full_title: bar.resolver().full_title_for(client),
        percentage: state.percentage(),
        color: state.color(),
    }
}

// ============================================================================
// Bar Actor
// ============================================================================

/// The bar actor - owns all bars and sessions.
///
/// Implements the actor pattern: receives commands via mpsc channel,
/// processes them sequentially, and publishes events to subscribers.
/// Every bar operation runs to completion on this task, so the engine
/// needs no locking.
pub struct BarActor {
    /// Command receiver
    receiver: mpsc::Receiver<BarCommand>,

    /// Bars keyed by id, iterated in creation order
    bars: BTreeMap<BarId, ManagedBar>,

    /// Next id handed out by `Create`
    next_bar_id: u64,

    /// Bar every attached client is subscribed to
    welcome_bar: Option<BarId>,

    /// Connected clients; the engine's transport
    sessions: SessionTable,

    /// Inbound message routing
    bus: MessageBus,

    /// Slot guarding the validator's registration on `bus`
    listeners: ListenerRegistry,

    /// Event publisher for observers
    event_publisher: broadcast::Sender<BarEvent>,
}

impl BarActor {
    /// Creates a new bar actor with the boss event validator registered.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `event_publisher` - Broadcast channel for publishing events
    /// * `welcome` - Welcome bar settings
    pub fn new(
        receiver: mpsc::Receiver<BarCommand>,
        event_publisher: broadcast::Sender<BarEvent>,
        welcome: &WelcomeBarConfig,
    ) -> Self {
        let mut actor = Self {
            receiver,
            bars: BTreeMap::new(),
            next_bar_id: 1,
            welcome_bar: None,
            sessions: SessionTable::new(),
            bus: MessageBus::new(),
            listeners: ListenerRegistry::new(),
            event_publisher,
        };

        actor.listeners.register(VALIDATOR_OWNER, &mut actor.bus);

        if welcome.enabled {
            actor.welcome_bar = actor.create_welcome_bar(welcome);
        }

        actor
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!("Bar actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            bars = self.bars.len(),
            sessions = self.sessions.len(),
            "Bar actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: BarCommand) {
        match cmd {
            BarCommand::Create {
                kind,
                anchor_id,
                title,
                respond_to,
            } => {
                let result = self.handle_create(kind, anchor_id, title);
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(result);
            }
            BarCommand::Drop { bar_id, respond_to } => {
                let _ = respond_to.send(self.handle_drop(bar_id));
            }
            BarCommand::Apply {
                bar_id,
                op,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_apply(bar_id, op));
            }
            BarCommand::GetBar { bar_id, respond_to } => {
                let _ = respond_to.send(self.bars.get(&bar_id).map(|bar| bar.snapshot(bar_id)));
            }
            BarCommand::ListBars { respond_to } => {
                let snapshots = self
                    .bars
                    .iter()
                    .map(|(id, bar)| bar.snapshot(*id))
                    .collect();
                let _ = respond_to.send(snapshots);
            }
            BarCommand::GetClientView {
                bar_id,
                client_id,
                respond_to,
            } => {
                let view = self.bars.get(&bar_id).map(|bar| bar.client_view(client_id));
                let _ = respond_to.send(view);
            }
            BarCommand::Attach {
                client_id,
                name,
                sender,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_attach(client_id, name, sender));
            }
            BarCommand::Detach { client_id } => {
                self.handle_detach(client_id);
            }
            BarCommand::Inbound { client_id, message } => {
                self.handle_inbound(client_id, message);
            }
            BarCommand::ListSessions { respond_to } => {
                let _ = respond_to.send(self.sessions.list());
            }
            BarCommand::RegisterValidator { owner, respond_to } => {
                let _ = respond_to.send(self.listeners.register(&owner, &mut self.bus));
            }
            BarCommand::UnregisterValidator { respond_to } => {
                self.listeners.unregister(&mut self.bus);
                let _ = respond_to.send(());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_create(
        &mut self,
        kind: BarKind,
        anchor_id: Option<EntityId>,
        title: String,
    ) -> Result<BarId, BarError> {
        if self.bars.len() >= MAX_BARS {
            warn!(
                current = self.bars.len(),
                max = MAX_BARS,
                "Bar limit reached, rejecting create"
            );
            return Err(BarError::TooManyBars { max: MAX_BARS });
        }

        // No subscribers yet, so setting the title sends nothing.
        let bar = match kind {
            BarKind::Shared => {
                let mut bar = match anchor_id {
                    Some(id) => SharedBossBar::with_anchor_id(id),
                    None => SharedBossBar::new(),
                };
                bar.set_title(&self.sessions, title);
                ManagedBar::Shared(bar)
            }
            BarKind::Diverse => {
                let mut bar = match anchor_id {
                    Some(id) => DiverseBossBar::with_anchor_id(id),
                    None => DiverseBossBar::new(),
                };
                bar.set_title(&self.sessions, title);
                ManagedBar::Diverse(bar)
            }
        };

        let bar_id = BarId::new(self.next_bar_id);
        self.next_bar_id += 1;
        self.bars.insert(bar_id, bar);

        info!(bar_id = %bar_id, kind = %kind, total = self.bars.len(), "Bar created");
        let _ = self.event_publisher.send(BarEvent::Created { bar_id, kind });

        Ok(bar_id)
    }

    fn create_welcome_bar(&mut self, welcome: &WelcomeBarConfig) -> Option<BarId> {
        let kind = if welcome.diverse {
            BarKind::Diverse
        } else {
            BarKind::Shared
        };
        let bar_id = match self.handle_create(kind, None, welcome.title.clone()) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to create welcome bar");
                return None;
            }
        };

        let setup = [
            BarOp::SetSubTitle(welcome.sub_title.clone()),
            BarOp::SetPercentage(welcome.percentage),
            BarOp::SetColor(welcome.color),
        ];
        for op in setup {
            if let Err(e) = self.handle_apply(bar_id, op) {
                warn!(bar_id = %bar_id, error = %e, "Failed to configure welcome bar");
            }
        }

        info!(bar_id = %bar_id, "Welcome bar ready");
        Some(bar_id)
    }

    fn handle_drop(&mut self, bar_id: BarId) -> Result<(), BarError> {
        let mut bar = self
            .bars
            .remove(&bar_id)
            .ok_or(BarError::BarNotFound(bar_id))?;
        bar.remove_all_players(&self.sessions);

        if self.welcome_bar == Some(bar_id) {
            self.welcome_bar = None;
        }

        info!(bar_id = %bar_id, remaining = self.bars.len(), "Bar dropped");
        let _ = self.event_publisher.send(BarEvent::Dropped { bar_id });
        Ok(())
    }

    fn handle_apply(&mut self, bar_id: BarId, op: BarOp) -> Result<(), BarError> {
        let bar = self
            .bars
            .get_mut(&bar_id)
            .ok_or(BarError::BarNotFound(bar_id))?;
        let name = op.name();

        bar.apply(bar_id, &self.sessions, op).inspect_err(|e| {
            debug!(bar_id = %bar_id, op = name, error = %e, "Bar operation rejected");
        })
    }

    fn handle_attach(
        &mut self,
        client_id: ClientId,
        name: Option<String>,
        sender: OutboundSender,
    ) -> Result<(), BarError> {
        if !self.sessions.attach(client_id, sender, name) {
            return Err(BarError::AlreadyAttached(client_id));
        }
        let _ = self
            .event_publisher
            .send(BarEvent::SessionAttached { client_id });

        if let Some(bar) = self.welcome_bar.and_then(|id| self.bars.get_mut(&id)) {
            bar.add_player(&self.sessions, client_id);
        }
        Ok(())
    }

    fn handle_detach(&mut self, client_id: ClientId) {
        self.release_client(client_id);
        if self.sessions.detach(client_id) {
            let _ = self
                .event_publisher
                .send(BarEvent::SessionDetached { client_id });
        }
    }

    fn handle_inbound(&mut self, client_id: ClientId, message: MessageType) {
        if !self.sessions.contains(client_id) {
            debug!(client = %client_id, "Dropping message from detached client");
            return;
        }

        let dispatch = self.bus.dispatch(&self.sessions, client_id, &message);
        if dispatch.disconnected {
            self.release_client(client_id);
            let _ = self.event_publisher.send(BarEvent::Kicked { client_id });
        }
    }

    /// Removes a client from every bar it is subscribed to.
    fn release_client(&mut self, client_id: ClientId) {
        let mut released = 0usize;
        for bar in self.bars.values_mut() {
            if bar.remove_player(&self.sessions, client_id) {
                released += 1;
            }
        }
        if released > 0 {
            debug!(client = %client_id, bars = released, "Client removed from bars");
        }
    }
}
