//! Client interface for interacting with the BarActor.
//!
//! The `BarHandle` provides a cheap-to-clone interface for sending commands
//! to the bar actor and subscribing to bar events.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `BarError::ChannelClosed`

use tokio::sync::{broadcast, mpsc, oneshot};

use bossbar_core::{Anchor, BarColor, ClientId, EntityId};
use bossbar_protocol::MessageType;

use super::commands::{
    BarCommand, BarError, BarEvent, BarId, BarKind, BarOp, BarSnapshot, ClientView,
};
use crate::session::{OutboundSender, SessionInfo};

// ============================================================================
// Bar Handle
// ============================================================================

/// Handle for interacting with the bar actor.
///
/// All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let bar = handle.create_bar(BarKind::Diverse, None, "Raid Boss").await?;
/// handle.add_players(bar, vec![client]).await?;
/// handle.set_percentage(bar, 0.75).await?;
/// handle.set_title_for(bar, vec![client], "Your target").await?;
/// ```
#[derive(Clone)]
pub struct BarHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<BarCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<BarEvent>,
}

impl BarHandle {
    pub fn new(sender: mpsc::Sender<BarCommand>, event_sender: broadcast::Sender<BarEvent>) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Subscribe to bar events.
    pub fn subscribe(&self) -> broadcast::Receiver<BarEvent> {
        self.event_sender.subscribe()
    }

    /// Sends a request and awaits its response.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> BarCommand,
    ) -> Result<T, BarError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| BarError::ChannelClosed)?;
        rx.await.map_err(|_| BarError::ChannelClosed)
    }

    // ========================================================================
    // Bar lifecycle
    // ========================================================================

    /// Create a bar.
    ///
    /// # Errors
    ///
    /// - `BarError::TooManyBars` if the service is at capacity
    /// - `BarError::ChannelClosed` if the actor has shut down
    pub async fn create_bar(
        &self,
        kind: BarKind,
        anchor_id: Option<EntityId>,
        title: impl Into<String>,
    ) -> Result<BarId, BarError> {
        let title = title.into();
        self.request(|respond_to| BarCommand::Create {
            kind,
            anchor_id,
            title,
            respond_to,
        })
        .await?
    }

    /// Hide a bar from everyone and drop it.
    pub async fn drop_bar(&self, bar_id: BarId) -> Result<(), BarError> {
        self.request(|respond_to| BarCommand::Drop { bar_id, respond_to })
            .await?
    }

    /// Apply one operation to a bar.
    ///
    /// # Errors
    ///
    /// - `BarError::BarNotFound` if the bar doesn't exist
    /// - `BarError::WrongBarKind` for per-client operations on a shared bar
    /// - `BarError::InvalidAnchor` if an anchor can not be attached
    /// - `BarError::ChannelClosed` if the actor has shut down
    pub async fn apply(&self, bar_id: BarId, op: BarOp) -> Result<(), BarError> {
        self.request(|respond_to| BarCommand::Apply {
            bar_id,
            op,
            respond_to,
        })
        .await?
    }

    // ========================================================================
    // Bar operations
    // ========================================================================

    pub async fn add_players(&self, bar_id: BarId, clients: Vec<ClientId>) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::AddPlayers(clients)).await
    }

    pub async fn remove_players(
        &self,
        bar_id: BarId,
        clients: Vec<ClientId>,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::RemovePlayers(clients)).await
    }

    pub async fn remove_all_players(&self, bar_id: BarId) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::RemoveAllPlayers).await
    }

    pub async fn set_title(&self, bar_id: BarId, title: impl Into<String>) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetTitle(title.into())).await
    }

    pub async fn set_sub_title(
        &self,
        bar_id: BarId,
        sub_title: impl Into<String>,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetSubTitle(sub_title.into())).await
    }

    pub async fn set_percentage(&self, bar_id: BarId, percentage: f32) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetPercentage(percentage)).await
    }

    pub async fn set_color(&self, bar_id: BarId, color: BarColor) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetColor(color)).await
    }

    pub async fn hide_from(&self, bar_id: BarId, clients: Vec<ClientId>) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::HideFrom(clients)).await
    }

    pub async fn hide_from_all(&self, bar_id: BarId) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::HideFromAll).await
    }

    pub async fn show_to(&self, bar_id: BarId, clients: Vec<ClientId>) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::ShowTo(clients)).await
    }

    pub async fn show_to_all(&self, bar_id: BarId) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::ShowToAll).await
    }

    pub async fn set_anchor(&self, bar_id: BarId, anchor: Option<Anchor>) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetAnchor(anchor)).await
    }

    pub async fn set_title_for(
        &self,
        bar_id: BarId,
        clients: Vec<ClientId>,
        title: impl Into<String>,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetTitleFor(clients, title.into()))
            .await
    }

    pub async fn set_sub_title_for(
        &self,
        bar_id: BarId,
        clients: Vec<ClientId>,
        sub_title: impl Into<String>,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetSubTitleFor(clients, sub_title.into()))
            .await
    }

    pub async fn set_percentage_for(
        &self,
        bar_id: BarId,
        clients: Vec<ClientId>,
        percentage: f32,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetPercentageFor(clients, percentage))
            .await
    }

    pub async fn set_color_for(
        &self,
        bar_id: BarId,
        clients: Vec<ClientId>,
        color: BarColor,
    ) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::SetColorFor(clients, color)).await
    }

    pub async fn reset_for(&self, bar_id: BarId, client: ClientId) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::ResetFor(client)).await
    }

    pub async fn reset_for_all(&self, bar_id: BarId) -> Result<(), BarError> {
        self.apply(bar_id, BarOp::ResetForAll).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of one bar, `None` if it doesn't exist or the actor is gone.
    pub async fn get_bar(&self, bar_id: BarId) -> Option<BarSnapshot> {
        self.request(|respond_to| BarCommand::GetBar { bar_id, respond_to })
            .await
            .ok()
            .flatten()
    }

    /// All bars. Empty if the actor is gone.
    pub async fn list_bars(&self) -> Vec<BarSnapshot> {
        self.request(|respond_to| BarCommand::ListBars { respond_to })
            .await
            .unwrap_or_default()
    }

    /// What `client_id` sees on a bar.
    pub async fn client_view(&self, bar_id: BarId, client_id: ClientId) -> Option<ClientView> {
        self.request(|respond_to| BarCommand::GetClientView {
            bar_id,
            client_id,
            respond_to,
        })
        .await
        .ok()
        .flatten()
    }

    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        self.request(|respond_to| BarCommand::ListSessions { respond_to })
            .await
            .unwrap_or_default()
    }

    // ========================================================================
    // Sessions and inbound traffic
    // ========================================================================

    /// Register a client's outbound queue.
    ///
    /// # Errors
    ///
    /// - `BarError::AlreadyAttached` if the client is already attached
    /// - `BarError::ChannelClosed` if the actor has shut down
    pub async fn attach(
        &self,
        client_id: ClientId,
        name: Option<String>,
        sender: OutboundSender,
    ) -> Result<(), BarError> {
        self.request(|respond_to| BarCommand::Attach {
            client_id,
            name,
            sender,
            respond_to,
        })
        .await?
    }

    /// Forget a client. Fire-and-forget.
    pub async fn detach(&self, client_id: ClientId) -> Result<(), BarError> {
        self.sender
            .send(BarCommand::Detach { client_id })
            .await
            .map_err(|_| BarError::ChannelClosed)
    }

    /// Hand an inbound message to the message bus. Fire-and-forget.
    pub async fn inbound(&self, client_id: ClientId, message: MessageType) -> Result<(), BarError> {
        self.sender
            .send(BarCommand::Inbound { client_id, message })
            .await
            .map_err(|_| BarError::ChannelClosed)
    }

    /// Attach the boss event validator. Returns false if it was already attached.
    pub async fn register_validator(&self, owner: impl Into<String>) -> Result<bool, BarError> {
        let owner = owner.into();
        self.request(|respond_to| BarCommand::RegisterValidator { owner, respond_to })
            .await
    }

    pub async fn unregister_validator(&self) -> Result<(), BarError> {
        self.request(|respond_to| BarCommand::UnregisterValidator { respond_to })
            .await
    }
}
