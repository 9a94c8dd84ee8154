//! Outbound boss bar synchronization messages.
//!
//! These are abstract message kinds. Wire encoding belongs to the transport.

use crate::{BarColor, BarState, EntityId};
use serde::{Deserialize, Serialize};

/// Value the protocol expects in the "darken screen" slot of a show message.
pub const DARKEN_SCREEN_DEFAULT: u16 = 1;

/// Value the protocol expects in the overlay slot of a show message.
pub const OVERLAY_DEFAULT: u32 = 0;

/// A message sent to one client to update its view of a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BarPacket {
    /// Display the bar with its full current state.
    Show {
        target_id: EntityId,
        title: String,
        percentage: f32,
        color: BarColor,
        darken_screen: u16,
        overlay: u32,
    },

    /// Stop displaying the bar.
    Hide { target_id: EntityId },

    /// The bar's full title changed.
    TitleChanged { target_id: EntityId, title: String },

    /// The bar's fill percentage changed.
    HealthChanged { target_id: EntityId, percentage: f32 },
}

/// Discriminant of a [`BarPacket`], handy for assertions and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Show,
    Hide,
    TitleChanged,
    HealthChanged,
}

impl BarPacket {
    /// Builds a show message from `state`, using `title` as the displayed text.
    pub fn show(target_id: EntityId, title: String, state: &BarState) -> Self {
        Self::Show {
            target_id,
            title,
            percentage: state.percentage(),
            color: state.color(),
            darken_screen: DARKEN_SCREEN_DEFAULT,
            overlay: OVERLAY_DEFAULT,
        }
    }

    pub fn hide(target_id: EntityId) -> Self {
        Self::Hide { target_id }
    }

    pub fn title_changed(target_id: EntityId, title: String) -> Self {
        Self::TitleChanged { target_id, title }
    }

    pub fn health_changed(target_id: EntityId, percentage: f32) -> Self {
        Self::HealthChanged {
            target_id,
            percentage,
        }
    }

    pub fn target_id(&self) -> EntityId {
        match self {
            Self::Show { target_id, .. }
            | Self::Hide { target_id }
            | Self::TitleChanged { target_id, .. }
            | Self::HealthChanged { target_id, .. } => *target_id,
        }
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Show { .. } => PacketKind::Show,
            Self::Hide { .. } => PacketKind::Hide,
            Self::TitleChanged { .. } => PacketKind::TitleChanged,
            Self::HealthChanged { .. } => PacketKind::HealthChanged,
        }
    }
}
