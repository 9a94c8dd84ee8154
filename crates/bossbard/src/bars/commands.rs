//! Bar actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `BarActor`:
//! - `BarCommand`: Commands sent to the actor
//! - `BarOp`: Mutations applied to a single bar
//! - `BarError`: Errors that can occur during bar operations
//! - `BarEvent`: Events published by the actor for observers
//!
//! All types are designed for async message passing and follow the panic-free policy.

use std::fmt;

use bossbar_core::{Anchor, BarColor, ClientId, DomainError, EntityId};
use bossbar_protocol::MessageType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::session::{OutboundSender, SessionInfo};

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a bar owned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarId(u64);

impl BarId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bar-{}", self.0)
    }
}

/// Whether a bar shows one state to everyone or a state per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarKind {
    Shared,
    Diverse,
}

impl fmt::Display for BarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Diverse => write!(f, "diverse"),
        }
    }
}

// ============================================================================
// Bar Operations
// ============================================================================

/// A mutation of one bar.
///
/// The `*For` and `Reset*` operations only apply to diverse bars.
#[derive(Debug, Clone, PartialEq)]
pub enum BarOp {
    AddPlayers(Vec<ClientId>),
    RemovePlayers(Vec<ClientId>),
    RemoveAllPlayers,
    SetTitle(String),
    SetSubTitle(String),
    SetPercentage(f32),
    SetColor(BarColor),
    HideFrom(Vec<ClientId>),
    HideFromAll,
    ShowTo(Vec<ClientId>),
    ShowToAll,
    SetAnchor(Option<Anchor>),
    SetTitleFor(Vec<ClientId>, String),
    SetSubTitleFor(Vec<ClientId>, String),
    SetPercentageFor(Vec<ClientId>, f32),
    SetColorFor(Vec<ClientId>, BarColor),
    ResetFor(ClientId),
    ResetForAll,
}

impl BarOp {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPlayers(_) => "add_players",
            Self::RemovePlayers(_) => "remove_players",
            Self::RemoveAllPlayers => "remove_all_players",
            Self::SetTitle(_) => "set_title",
            Self::SetSubTitle(_) => "set_sub_title",
            Self::SetPercentage(_) => "set_percentage",
            Self::SetColor(_) => "set_color",
            Self::HideFrom(_) => "hide_from",
            Self::HideFromAll => "hide_from_all",
            Self::ShowTo(_) => "show_to",
            Self::ShowToAll => "show_to_all",
            Self::SetAnchor(_) => "set_anchor",
            Self::SetTitleFor(..) => "set_title_for",
            Self::SetSubTitleFor(..) => "set_sub_title_for",
            Self::SetPercentageFor(..) => "set_percentage_for",
            Self::SetColorFor(..) => "set_color_for",
            Self::ResetFor(_) => "reset_for",
            Self::ResetForAll => "reset_for_all",
        }
    }
}

// ============================================================================
// Bar Commands
// ============================================================================

/// Commands sent to the bar actor.
///
/// Each request-style command carries a oneshot channel for the response.
#[derive(Debug)]
pub enum BarCommand {
    /// Create a new bar.
    ///
    /// # Errors
    /// - `BarError::TooManyBars` if at maximum capacity
    Create {
        kind: BarKind,
        /// Dedicated target id; `None` addresses each client by its own id
        anchor_id: Option<EntityId>,
        title: String,
        respond_to: oneshot::Sender<Result<BarId, BarError>>,
    },

    /// Hide a bar from its subscribers and drop it.
    ///
    /// # Errors
    /// - `BarError::BarNotFound` if the bar doesn't exist
    Drop {
        bar_id: BarId,
        respond_to: oneshot::Sender<Result<(), BarError>>,
    },

    /// Apply one operation to a bar.
    ///
    /// # Errors
    /// - `BarError::BarNotFound` if the bar doesn't exist
    /// - `BarError::WrongBarKind` for a per-client operation on a shared bar
    /// - `BarError::InvalidAnchor` if `SetAnchor` is given an unusable anchor
    Apply {
        bar_id: BarId,
        op: BarOp,
        respond_to: oneshot::Sender<Result<(), BarError>>,
    },

    /// Snapshot of one bar.
    GetBar {
        bar_id: BarId,
        respond_to: oneshot::Sender<Option<BarSnapshot>>,
    },

    /// Snapshots of all bars, ordered by id.
    ListBars {
        respond_to: oneshot::Sender<Vec<BarSnapshot>>,
    },

    /// The state one client sees on a bar.
    GetClientView {
        bar_id: BarId,
        client_id: ClientId,
        respond_to: oneshot::Sender<Option<ClientView>>,
    },

    /// Register a client's outbound queue.
    ///
    /// The client is subscribed to the welcome bar if one is configured.
    Attach {
        client_id: ClientId,
        name: Option<String>,
        sender: OutboundSender,
        respond_to: oneshot::Sender<Result<(), BarError>>,
    },

    /// Forget a client and remove it from every bar.
    Detach { client_id: ClientId },

    /// Route an inbound client message through the message bus.
    Inbound {
        client_id: ClientId,
        message: MessageType,
    },

    /// List connected sessions.
    ListSessions {
        respond_to: oneshot::Sender<Vec<SessionInfo>>,
    },

    /// Attach the boss event validator to the bus.
    RegisterValidator {
        owner: String,
        respond_to: oneshot::Sender<bool>,
    },

    /// Detach the boss event validator from the bus.
    UnregisterValidator { respond_to: oneshot::Sender<()> },
}

// ============================================================================
// Bar Errors
// ============================================================================

/// Errors that can occur during bar operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    /// The service has reached its maximum bar count.
    #[error("too many bars (max: {max})")]
    TooManyBars { max: usize },

    /// The requested bar was not found.
    #[error("bar not found: {0}")]
    BarNotFound(BarId),

    /// The operation is not supported by this kind of bar.
    #[error("{op} is not supported by {kind} bar {bar_id}")]
    WrongBarKind {
        bar_id: BarId,
        kind: BarKind,
        op: &'static str,
    },

    /// The anchor could not be attached.
    #[error(transparent)]
    InvalidAnchor(#[from] DomainError),

    /// A session for this client is already attached.
    #[error("client already attached: {0}")]
    AlreadyAttached(ClientId),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Views
// ============================================================================

/// Read-only copy of a bar's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSnapshot {
    pub id: BarId,
    pub kind: BarKind,
    pub anchor_id: Option<EntityId>,
    pub title: String,
    pub sub_title: String,
    pub full_title: String,
    pub percentage: f32,
    pub color: BarColor,
    /// Subscribers in ascending id order
    pub subscribers: Vec<ClientId>,
    pub override_count: usize,
    /// Human readable summary
    pub summary: String,
}

/// What one client currently sees on a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientView {
    pub subscribed: bool,
    /// Subscribed, but the bar is hidden from the client
    pub hidden: bool,
    pub has_override: bool,
    pub title: String,
    pub sub_title: String,
    pub full_title: String,
    pub percentage: f32,
    pub color: BarColor,
}

// ============================================================================
// Bar Events
// ============================================================================

/// Events published by the bar actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarEvent {
    Created { bar_id: BarId, kind: BarKind },
    Dropped { bar_id: BarId },
    SessionAttached { client_id: ClientId },
    SessionDetached { client_id: ClientId },
    /// A client was disconnected for a protocol violation.
    Kicked { client_id: ClientId },
}
