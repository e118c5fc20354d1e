//! Process-wide room and presence bookkeeping.
//!
//! The registry is the only cross-connection shared mutable state in the
//! relay. It is an explicit service object with internally guarded maps;
//! nothing here is ambient or static.

use crate::event::RoomEvent;
use crate::room::Room;
use crate::session::{DocumentId, SessionEntry, SessionId};
use dashmap::DashMap;
use slugline_protocol::{Participant, PresenceInfo};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Broadcast capacity per room.
    pub room_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            room_capacity: 1024,
        }
    }
}

/// Room membership and presence for one relay process.
///
/// Rooms are created lazily on first join and deleted when their last
/// member leaves: a room exists if and only if its member set is
/// non-empty. The presence table is global (not room-scoped) so a
/// disconnect can be cleaned up with a single lookup.
pub struct RoomRegistry {
    /// Rooms indexed by document id.
    rooms: DashMap<DocumentId, Room>,
    /// Presence table: session id -> joined document, user, presence.
    sessions: DashMap<SessionId, SessionEntry>,
    /// Configuration.
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            sessions: DashMap::new(),
            config,
        }
    }

    /// Register a session in the room for `document_id`, creating the room
    /// if absent.
    ///
    /// Returns a receiver for the room's events. Re-joining the same
    /// document with the same session id is idempotent and overwrites the
    /// stored presence; a session is in at most one room at a time, so a
    /// join to a different document moves it.
    pub fn join(
        &self,
        document_id: &str,
        session_id: &str,
        user_id: &str,
        presence: PresenceInfo,
    ) -> broadcast::Receiver<Arc<RoomEvent>> {
        // A session re-joining a different document leaves its old room first.
        if let Some(entry) = self.sessions.get(session_id) {
            if entry.document_id != document_id {
                let previous = entry.document_id.clone();
                drop(entry);
                warn!(
                    session = %session_id,
                    from = %previous,
                    to = %document_id,
                    "Session re-joined a different document without leaving"
                );
                self.leave(session_id);
            }
        }

        self.sessions.insert(
            session_id.to_string(),
            SessionEntry::new(document_id, user_id, presence),
        );

        let mut room = self
            .rooms
            .entry(document_id.to_string())
            .or_insert_with(|| {
                debug!(document = %document_id, "Creating room");
                Room::with_capacity(document_id, self.config.room_capacity)
            });

        let receiver = room.insert(session_id);

        debug!(
            document = %document_id,
            session = %session_id,
            members = room.member_count(),
            "Joined"
        );

        receiver
    }

    /// Presence snapshot of every session in the room for `document_id`
    /// other than `excluding`, in unspecified order.
    #[must_use]
    pub fn list_others(&self, document_id: &str, excluding: &str) -> Vec<Participant> {
        let Some(room) = self.rooms.get(document_id) else {
            return Vec::new();
        };

        room.members()
            .iter()
            .filter(|id| id.as_str() != excluding)
            .filter_map(|id| self.sessions.get(id).map(|entry| entry.participant(id)))
            .collect()
    }

    /// Remove a session from its room and the presence table.
    ///
    /// Deletes the room if it becomes empty. Safe to call on an unknown or
    /// already-removed session id.
    pub fn leave(&self, session_id: &str) -> Option<SessionEntry> {
        let (_, entry) = self.sessions.remove(session_id)?;

        if let Some(mut room) = self.rooms.get_mut(&entry.document_id) {
            room.remove(session_id);

            debug!(
                document = %entry.document_id,
                session = %session_id,
                members = room.member_count(),
                "Left"
            );

            if room.is_empty() {
                drop(room); // Release the lock
                self.rooms.remove(&entry.document_id);
                debug!(document = %entry.document_id, "Deleted empty room");
            }
        }

        Some(entry)
    }

    /// Broadcast an event to the room for `document_id`.
    ///
    /// Returns the number of receivers the event reached.
    pub fn broadcast(&self, document_id: &str, event: RoomEvent) -> usize {
        if let Some(room) = self.rooms.get(document_id) {
            let count = room.broadcast(event);
            trace!(document = %document_id, recipients = count, "Broadcast room event");
            count
        } else {
            warn!(document = %document_id, "Broadcast to non-existent room");
            0
        }
    }

    /// Check if a room exists.
    #[must_use]
    pub fn room_exists(&self, document_id: &str) -> bool {
        self.rooms.contains_key(document_id)
    }

    /// Get the member count for a room.
    #[must_use]
    pub fn member_count(&self, document_id: &str) -> usize {
        self.rooms
            .get(document_id)
            .map(|r| r.member_count())
            .unwrap_or(0)
    }

    /// Look up the presence entry for a session.
    #[must_use]
    pub fn session_entry(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            room_count: self.rooms.len(),
            session_count: self.sessions.len(),
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics.
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Number of live rooms.
    pub room_count: usize,
    /// Number of joined sessions.
    pub session_count: usize,
}
