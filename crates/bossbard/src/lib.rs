//! Bossbar Daemon - Bar service and client session server
//!
//! This crate hosts the boss bar engine for connected clients:
//! - `bars` - Bar service actor that owns every bar and client session
//! - `session` - Session table, the engine's `Transport` implementation
//! - `listener` - Inbound message bus and the boss event validator
//! - `server` - Unix socket server for client connections
//! - `config` - TOML daemon configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      bossbard daemon                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  DaemonServer   │────▶│         BarActor            │   │
//! │  │ (Unix Socket)   │     │ (bars + SessionTable + bus) │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ connections                 │ ServerMessage     │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │ConnectionHandler│◀────│  per-client outbound queue  │   │
//! │  │  (per client)   │     │  (mpsc::UnboundedSender)    │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod bars;
pub mod config;
pub mod listener;
pub mod server;
pub mod session;
