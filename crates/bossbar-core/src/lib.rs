//! Bossbar Core - Boss bar state model and synchronization engine
//!
//! This crate owns the server-side state of boss bars and computes the
//! messages that keep every subscribed client's view in sync. Delivery is
//! delegated to a [`Transport`] supplied by the hosting application.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod attribute;
pub mod bar;
pub mod color;
pub mod diverse;
pub mod error;
pub mod id;
pub mod packet;
pub mod resolver;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use attribute::AttributeValue;
pub use bar::{BossBar, SharedBossBar};
pub use color::BarColor;
pub use diverse::DiverseBossBar;
pub use error::{DomainError, DomainResult};
pub use id::{Anchor, ClientId, EntityId};
pub use packet::{BarPacket, PacketKind};
pub use resolver::{BarStateResolver, PerClientResolver, SharedResolver};
pub use state::{BarState, SUBTITLE_SEPARATOR};
pub use transport::{Transport, TransportError};
