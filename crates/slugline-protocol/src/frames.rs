//! Frame types for the slugline relay protocol.
//!
//! Frames are the unit of communication between editors and the relay.
//! Each frame is serialized with MessagePack; delta payloads are carried
//! as raw bytes and never interpreted by the relay.

use serde::{Deserialize, Serialize};

use crate::presence::{Participant, PresenceInfo};

/// Frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum FrameType {
    JoinDocument = 0x01,
    DocumentDelta = 0x02,
    PresenceDelta = 0x03,
    CurrentUsers = 0x04,
    UserJoined = 0x05,
    UserLeft = 0x06,
    Welcome = 0x07,
    Error = 0x08,
    Ping = 0x09,
    Pong = 0x0A,
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        ft as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(FrameType::JoinDocument),
            0x02 => Ok(FrameType::DocumentDelta),
            0x03 => Ok(FrameType::PresenceDelta),
            0x04 => Ok(FrameType::CurrentUsers),
            0x05 => Ok(FrameType::UserJoined),
            0x06 => Ok(FrameType::UserLeft),
            0x07 => Ok(FrameType::Welcome),
            0x08 => Ok(FrameType::Error),
            0x09 => Ok(FrameType::Ping),
            0x0A => Ok(FrameType::Pong),
            _ => Err("Invalid frame type"),
        }
    }
}

/// Protocol error code: join with missing identifiers.
pub const ERR_INVALID_JOIN: u16 = 4001;

/// Protocol error code: join while already in a room.
pub const ERR_ALREADY_JOINED: u16 = 4002;

/// Protocol error code: delta sent before joining a document.
pub const ERR_NOT_JOINED: u16 = 4003;

/// A protocol frame.
///
/// Frames flow in both directions; `from` fields are filled in by the
/// relay on the way down so receivers can attribute deltas to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Enter the room for a document.
    #[serde(rename = "join-document")]
    JoinDocument {
        /// Document to collaborate on.
        document_id: String,
        /// User behind this session.
        user_id: String,
        /// Initial presence metadata.
        presence: PresenceInfo,
    },

    /// An opaque replicated-document update.
    #[serde(rename = "document-delta")]
    DocumentDelta {
        /// Session ID of the originating peer (relay-filled).
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// Delta bytes, relayed verbatim.
        #[serde(with = "serde_bytes")]
        payload: Vec<u8>,
    },

    /// A presence update.
    #[serde(rename = "presence-delta")]
    PresenceDelta {
        /// Session ID of the originating peer (relay-filled).
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// Encoded presence payload.
        #[serde(with = "serde_bytes")]
        payload: Vec<u8>,
    },

    /// Snapshot of the room sent once, immediately after a join.
    #[serde(rename = "current-users")]
    CurrentUsers {
        /// Every other member of the room.
        users: Vec<Participant>,
    },

    /// A peer entered the room.
    #[serde(rename = "user-joined")]
    UserJoined {
        /// The new member.
        user: Participant,
    },

    /// A peer left the room.
    #[serde(rename = "user-left")]
    UserLeft {
        /// Session ID of the departed peer.
        session_id: String,
        /// User ID of the departed peer.
        user_id: String,
    },

    /// Connection established; first frame the relay sends.
    #[serde(rename = "welcome")]
    Welcome {
        /// Session ID assigned to this connection.
        session_id: String,
        /// Recommended keepalive interval in milliseconds.
        heartbeat: u32,
    },

    /// Protocol error.
    #[serde(rename = "error")]
    Error {
        /// Error code.
        code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Keepalive ping.
    #[serde(rename = "ping")]
    Ping {
        /// Optional timestamp.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Keepalive pong.
    #[serde(rename = "pong")]
    Pong {
        /// Echoed timestamp from ping.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },
}

impl Frame {
    /// Get the frame type.
    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::JoinDocument { .. } => FrameType::JoinDocument,
            Frame::DocumentDelta { .. } => FrameType::DocumentDelta,
            Frame::PresenceDelta { .. } => FrameType::PresenceDelta,
            Frame::CurrentUsers { .. } => FrameType::CurrentUsers,
            Frame::UserJoined { .. } => FrameType::UserJoined,
            Frame::UserLeft { .. } => FrameType::UserLeft,
            Frame::Welcome { .. } => FrameType::Welcome,
            Frame::Error { .. } => FrameType::Error,
            Frame::Ping { .. } => FrameType::Ping,
            Frame::Pong { .. } => FrameType::Pong,
        }
    }

    /// Create a new JoinDocument frame.
    #[must_use]
    pub fn join_document(
        document_id: impl Into<String>,
        user_id: impl Into<String>,
        presence: PresenceInfo,
    ) -> Self {
        Frame::JoinDocument {
            document_id: document_id.into(),
            user_id: user_id.into(),
            presence,
        }
    }

    /// Create a client-side DocumentDelta frame (no sender attribution).
    #[must_use]
    pub fn document_delta(payload: impl Into<Vec<u8>>) -> Self {
        Frame::DocumentDelta {
            from: None,
            payload: payload.into(),
        }
    }

    /// Create a relayed DocumentDelta frame tagged with its sender.
    #[must_use]
    pub fn document_delta_from(from: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Frame::DocumentDelta {
            from: Some(from.into()),
            payload: payload.into(),
        }
    }

    /// Create a client-side PresenceDelta frame.
    #[must_use]
    pub fn presence_delta(payload: impl Into<Vec<u8>>) -> Self {
        Frame::PresenceDelta {
            from: None,
            payload: payload.into(),
        }
    }

    /// Create a relayed PresenceDelta frame tagged with its sender.
    #[must_use]
    pub fn presence_delta_from(from: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Frame::PresenceDelta {
            from: Some(from.into()),
            payload: payload.into(),
        }
    }

    /// Create a CurrentUsers snapshot frame.
    #[must_use]
    pub fn current_users(users: Vec<Participant>) -> Self {
        Frame::CurrentUsers { users }
    }

    /// Create a UserJoined frame.
    #[must_use]
    pub fn user_joined(user: Participant) -> Self {
        Frame::UserJoined { user }
    }

    /// Create a UserLeft frame.
    #[must_use]
    pub fn user_left(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Frame::UserLeft {
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a Welcome frame.
    #[must_use]
    pub fn welcome(session_id: impl Into<String>, heartbeat: u32) -> Self {
        Frame::Welcome {
            session_id: session_id.into(),
            heartbeat,
        }
    }

    /// Create an Error frame.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Frame::Error {
            code,
            message: message.into(),
        }
    }

    /// Create a Ping frame.
    #[must_use]
    pub fn ping(timestamp: Option<u64>) -> Self {
        Frame::Ping { timestamp }
    }

    /// Create a Pong frame.
    #[must_use]
    pub fn pong(timestamp: Option<u64>) -> Self {
        Frame::Pong { timestamp }
    }
}
