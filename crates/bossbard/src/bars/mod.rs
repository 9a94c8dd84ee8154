//! Bar service using the Actor pattern.
//!
//! The bar service owns every bar and every client session. It receives
//! commands via a tokio mpsc channel, so bar state is only ever mutated
//! from a single task.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │   BarHandle     │────▶│    BarActor     │────▶│ Broadcast Channel│
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │                       │
//!         │   BarCommand          │   ServerMessage       │   BarEvent
//!         │   (mpsc channel)      │   (per-client queue)  │   (broadcast)
//!         ▼                       ▼                       ▼
//!    Create/Apply/           BossBar engine +        Observers
//!    Attach/Inbound          SessionTable
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::{broadcast, mpsc};

mod actor;
mod commands;
mod handle;

pub use actor::{BarActor, MAX_BARS, VALIDATOR_OWNER};
pub use commands::{
    BarCommand, BarError, BarEvent, BarId, BarKind, BarOp, BarSnapshot, ClientView,
};
pub use handle::BarHandle;

use crate::config::WelcomeBarConfig;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 256;
const EVENT_BUFFER: usize = 100;

/// Spawn the bar actor and return a handle for interaction.
///
/// # Example
///
/// ```no_run
/// use bossbard::bars::{spawn_bar_service, BarKind};
/// use bossbard::config::WelcomeBarConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_bar_service(&WelcomeBarConfig::default());
///     let bar = handle.create_bar(BarKind::Shared, None, "Boss").await;
/// }
/// ```
pub fn spawn_bar_service(welcome: &WelcomeBarConfig) -> BarHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = BarActor::new(cmd_rx, event_tx.clone(), welcome);
    tokio::spawn(actor.run());

    BarHandle::new(cmd_tx, event_tx)
}
