//! # slugline-client
//!
//! Editor-side sync client for the slugline collaboration relay.
//!
//! The client wraps one delta channel plus an opaque local replica:
//!
//! - **SyncClient** - Join lifecycle, delta routing, presence map
//! - **Debouncer** - Trailing-edge throttle for outgoing document deltas
//! - **Replica** - The narrow interface to the replication layer
//! - **color** - Deterministic per-user display colors
//!
//! Outgoing document deltas are coalesced (default 200 ms window) so fast
//! local typing does not flood the relay; incoming deltas are applied to
//! the replica immediately, because convergence wants them promptly.
//! Lifecycle and presence changes arrive on a typed event stream the
//! caller drains.
//!
//! ## Example
//!
//! ```rust,ignore
//! use slugline_client::{SyncClient, SyncClientOptions};
//! use slugline_protocol::PresenceInfo;
//! use slugline_transport::WebSocketChannel;
//!
//! let channel = WebSocketChannel::connect("ws://localhost:8080/ws").await?;
//! let (client, mut events) =
//!     SyncClient::start(Box::new(channel), Box::new(replica), SyncClientOptions::default());
//!
//! client.join("doc-42", "ada", PresenceInfo::new())?;
//! while let Some(event) = events.recv().await {
//!     // React to peers joining, presence changes, ...
//! }
//! ```

pub mod client;
pub mod color;
pub mod debounce;
pub mod replica;

pub use client::{ClientEvent, SyncClient, SyncClientOptions};
pub use color::color_for_user;
pub use debounce::Debouncer;
pub use replica::{Replica, ReplicaError};
