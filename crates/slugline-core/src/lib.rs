//! # slugline-core
//!
//! Room registry and session relay for the slugline collaboration server.
//!
//! This crate provides the server-side building blocks:
//!
//! - **Room** - Broadcast fan-out for the sessions editing one document
//! - **RoomRegistry** - Process-wide membership and presence bookkeeping
//! - **Relay** - Per-connection join/leave protocol and delta routing
//! - **RoomEvent** - Events fanned out to room members
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │RelaySession │────▶│RoomRegistry │────▶│    Room     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │presence tbl │
//!                     └─────────────┘
//! ```
//!
//! The relay never inspects delta payloads; document content merging is
//! the business of the replication layer on the editor side.

pub mod event;
pub mod registry;
pub mod relay;
pub mod room;
pub mod session;

pub use event::RoomEvent;
pub use registry::{RegistryConfig, RegistryStats, RoomRegistry};
pub use relay::{Relay, RelayError, RelaySession};
pub use room::Room;
pub use session::{generate_session_id, DocumentId, SessionEntry, SessionId};
