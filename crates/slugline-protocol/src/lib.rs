//! # slugline-protocol
//!
//! Wire protocol for the slugline collaboration relay.
//!
//! This crate defines the binary protocol spoken between screenplay
//! editors and the relay: frame types, the MessagePack codec with
//! length-prefixed framing, and the presence types carried inside frames.
//!
//! ## Frame Types
//!
//! - `JoinDocument` - Enter the room for one document
//! - `DocumentDelta` / `PresenceDelta` - Opaque updates relayed to peers
//! - `CurrentUsers` / `UserJoined` / `UserLeft` - Membership traffic
//! - `Welcome` / `Error` - Handshake and protocol errors
//!
//! ## Example
//!
//! ```rust
//! use slugline_protocol::{Frame, codec};
//!
//! let frame = Frame::document_delta(b"crdt bytes".to_vec());
//!
//! let encoded = codec::encode(&frame).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! ```

pub mod codec;
pub mod frames;
pub mod presence;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{Frame, FrameType};
pub use presence::{Participant, PresenceInfo};
