//! Bossbar Protocol - Wire protocol for daemon communication
//!
//! This crate provides the newline-delimited JSON messages exchanged
//! between game clients and the bossbar daemon, including the boss event
//! subtypes clients are allowed to originate.

pub mod event;
pub mod message;
pub mod version;

pub use event::BossEventType;
pub use message::{ClientMessage, MessageKind, MessageType, ServerMessage};
pub use version::{ProtocolVersion, VersionError};
