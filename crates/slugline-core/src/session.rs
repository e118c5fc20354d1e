//! Session identity and bookkeeping records.

use slugline_protocol::{Participant, PresenceInfo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque key scoping a room.
pub type DocumentId = String;

/// Unique identifier of one live connection.
pub type SessionId = String;

/// Atomic counter to keep IDs unique within the same nanosecond.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a session ID for a new connection.
#[must_use]
pub fn generate_session_id() -> SessionId {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sess_{:x}", timestamp.wrapping_add(counter))
}

/// Registry record for one joined session.
///
/// The registry owns only this back-reference; the session itself (its
/// connection handle and state machine) lives with the relay.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// Document the session joined.
    pub document_id: DocumentId,
    /// User behind the session.
    pub user_id: String,
    /// Presence metadata the session joined with.
    pub presence: PresenceInfo,
}

impl SessionEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(
        document_id: impl Into<DocumentId>,
        user_id: impl Into<String>,
        presence: PresenceInfo,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            user_id: user_id.into(),
            presence,
        }
    }

    /// Build the wire-facing participant record for this entry.
    #[must_use]
    pub fn participant(&self, session_id: &str) -> Participant {
        Participant::new(session_id, self.user_id.clone(), self.presence.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_uniqueness() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
        assert!(id1.starts_with("sess_"));
    }

    #[test]
    fn test_participant_from_entry() {
        let entry = SessionEntry::new("doc1", "ada", PresenceInfo::new().with_name("Ada"));
        let participant = entry.participant("sess-1");

        assert_eq!(participant.session_id, "sess-1");
        assert_eq!(participant.user_id, "ada");
        assert_eq!(participant.presence.name(), Some("Ada"));
    }
}
