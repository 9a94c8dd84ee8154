//! Type-safe identifiers for clients, entities and bar anchors.

use crate::AttributeValue;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Identifier of a connected client.
///
/// Assigned by the transport. Equality is identity: two handles with the
/// same id refer to the same connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The client's own entity id.
    ///
    /// Used as the bar's target id when the bar has no dedicated anchor.
    pub fn entity_id(&self) -> EntityId {
        EntityId(self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Protocol-level entity id a bar message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Anchor
// ============================================================================

/// An entity-like target a bar can be attached to.
///
/// Only the id is kept by the bar. If the anchor carries a health value it
/// is copied into the bar's own state when attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    id: EntityId,
    health: Option<AttributeValue>,
    closed: bool,
    flagged_for_removal: bool,
}

impl Anchor {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            health: None,
            closed: false,
            flagged_for_removal: false,
        }
    }

    /// Attaches a health value to be copied into the bar.
    #[must_use]
    pub fn with_health(mut self, health: AttributeValue) -> Self {
        self.health = Some(health);
        self
    }

    /// Marks the anchor as closed.
    #[must_use]
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Marks the anchor as scheduled for removal.
    #[must_use]
    pub fn flagged_for_removal(mut self) -> Self {
        self.flagged_for_removal = true;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn health(&self) -> Option<&AttributeValue> {
        self.health.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_flagged_for_removal(&self) -> bool {
        self.flagged_for_removal
    }

    /// An anchor is usable unless it is closed or flagged for removal.
    pub fn is_valid(&self) -> bool {
        !self.closed && !self.flagged_for_removal
    }
}
