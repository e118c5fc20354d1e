//! Events fanned out to the members of a room.

use crate::session::SessionId;
use bytes::Bytes;
use slugline_protocol::PresenceInfo;

/// An event delivered to every member of a room.
///
/// Each event records the session that caused it; receivers drop events
/// whose origin equals their own session id, which yields the
/// room-minus-sender delivery the protocol requires.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A peer entered the room.
    PeerJoined {
        /// Session that joined.
        session_id: SessionId,
        /// User behind the session.
        user_id: String,
        /// Presence metadata the peer joined with.
        presence: PresenceInfo,
    },

    /// A peer left the room (disconnect or teardown).
    PeerLeft {
        /// Session that left.
        session_id: SessionId,
        /// User behind the session.
        user_id: String,
    },

    /// An opaque document update from a peer, relayed verbatim.
    DocumentDelta {
        /// Originating session.
        from: SessionId,
        /// Delta bytes; never inspected, decoded, or reordered.
        payload: Bytes,
    },

    /// A presence update from a peer.
    PresenceDelta {
        /// Originating session.
        from: SessionId,
        /// Encoded presence payload.
        payload: Bytes,
    },
}

impl RoomEvent {
    /// The session this event originated from.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            RoomEvent::PeerJoined { session_id, .. } | RoomEvent::PeerLeft { session_id, .. } => {
                session_id
            }
            RoomEvent::DocumentDelta { from, .. } | RoomEvent::PresenceDelta { from, .. } => from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_origin() {
        let joined = RoomEvent::PeerJoined {
            session_id: "sess-1".into(),
            user_id: "ada".into(),
            presence: PresenceInfo::new(),
        };
        assert_eq!(joined.origin(), "sess-1");

        let delta = RoomEvent::DocumentDelta {
            from: "sess-2".into(),
            payload: Bytes::from_static(b"delta"),
        };
        assert_eq!(delta.origin(), "sess-2");
    }
}
