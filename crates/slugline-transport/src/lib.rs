//! # slugline-transport
//!
//! Delta channel abstraction for the slugline collaboration stack.
//!
//! A delta channel is the bidirectional, FIFO frame transport between one
//! editor and the relay. The sync client only needs send/receive/close
//! semantics, so everything else about the wire lives behind the
//! [`DeltaChannel`] trait:
//!
//! - **WebSocket** - The standard transport for browser and desktop editors
//! - **Memory** - An in-process channel pair for embedding and tests
//!
//! ```rust,ignore
//! use slugline_transport::DeltaChannel;
//!
//! async fn drain(mut channel: Box<dyn DeltaChannel>) {
//!     while let Ok(Some(frame)) = channel.recv().await {
//!         // Process frame
//!     }
//! }
//! ```

pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use memory::{memory_pair, MemoryChannel};
pub use traits::{ChannelError, DeltaChannel};

#[cfg(feature = "websocket")]
pub use websocket::WebSocketChannel;
