//! Room abstraction for the relay.
//!
//! A room is the set of sessions collaborating on one document, plus the
//! broadcast channel their events fan out over.

use crate::event::RoomEvent;
use crate::session::{DocumentId, SessionId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default broadcast capacity per room.
const DEFAULT_ROOM_CAPACITY: usize = 1024;

/// The sessions editing one document.
#[derive(Debug)]
pub struct Room {
    /// Document this room is scoped to.
    document_id: DocumentId,
    /// Broadcast sender for room events.
    sender: broadcast::Sender<Arc<RoomEvent>>,
    /// Member session ids.
    members: HashSet<SessionId>,
}

impl Room {
    /// Create a new room.
    #[must_use]
    pub fn new(document_id: impl Into<DocumentId>) -> Self {
        Self::with_capacity(document_id, DEFAULT_ROOM_CAPACITY)
    }

    /// Create a new room with a specific broadcast capacity.
    #[must_use]
    pub fn with_capacity(document_id: impl Into<DocumentId>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            document_id: document_id.into(),
            sender,
            members: HashSet::new(),
        }
    }

    /// Get the document id this room is scoped to.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Get the number of member sessions.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check if a session is a member.
    #[must_use]
    pub fn is_member(&self, session_id: &str) -> bool {
        self.members.contains(session_id)
    }

    /// Insert a session into the room.
    ///
    /// Returns a receiver for this room's events. Re-inserting an existing
    /// member just hands out a fresh receiver.
    pub fn insert(&mut self, session_id: impl Into<SessionId>) -> broadcast::Receiver<Arc<RoomEvent>> {
        let session_id = session_id.into();
        self.members.insert(session_id.clone());
        debug!(document = %self.document_id, session = %session_id, "Session entered room");
        self.sender.subscribe()
    }

    /// Remove a session from the room.
    ///
    /// Returns `true` if the session was a member.
    pub fn remove(&mut self, session_id: &str) -> bool {
        let removed = self.members.remove(session_id);
        if removed {
            debug!(document = %self.document_id, session = %session_id, "Session left room");
        }
        removed
    }

    /// Broadcast an event to every member's receiver.
    ///
    /// Returns the number of receivers the event reached.
    pub fn broadcast(&self, event: RoomEvent) -> usize {
        trace!(document = %self.document_id, "Broadcasting room event");
        self.sender.send(Arc::new(event)).unwrap_or_default()
    }

    /// Get all member session ids.
    #[must_use]
    pub fn members(&self) -> Vec<SessionId> {
        self.members.iter().cloned().collect()
    }

    /// Check if the room has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_room_creation() {
        let room = Room::new("doc1");
        assert_eq!(room.document_id(), "doc1");
        assert_eq!(room.member_count(), 0);
        assert!(room.is_empty());
    }

    #[test]
    fn test_room_insert_remove() {
        let mut room = Room::new("doc1");

        let _rx = room.insert("sess-1");
        assert_eq!(room.member_count(), 1);
        assert!(room.is_member("sess-1"));

        let _rx2 = room.insert("sess-2");
        assert_eq!(room.member_count(), 2);

        assert!(room.remove("sess-1"));
        assert_eq!(room.member_count(), 1);
        assert!(!room.is_member("sess-1"));

        // Removing an unknown session
        assert!(!room.remove("sess-1"));
    }

    #[tokio::test]
    async fn test_room_broadcast() {
        let mut room = Room::new("doc1");
        let mut rx = room.insert("sess-1");

        let count = room.broadcast(RoomEvent::DocumentDelta {
            from: "sess-2".into(),
            payload: Bytes::from_static(b"delta"),
        });
        assert_eq!(count, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.origin(), "sess-2");
    }
}
