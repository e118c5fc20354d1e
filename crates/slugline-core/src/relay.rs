//! Per-connection relay protocol.
//!
//! Each connection owns a [`RelaySession`] that walks the state machine
//! `Connected -> Joined -> Closed`. Side effects are strictly registry
//! mutation plus fan-out to the room; the relay holds no other state.

use crate::event::RoomEvent;
use crate::registry::RoomRegistry;
use crate::session::{generate_session_id, DocumentId, SessionId};
use bytes::Bytes;
use slugline_protocol::{Participant, PresenceInfo};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Join with an empty document id or user id.
    #[error("join requires a non-empty document id and user id")]
    InvalidJoin,

    /// Join while already in a room.
    #[error("session already joined document: {0}")]
    AlreadyJoined(DocumentId),

    /// Delta sent before joining a document.
    #[error("no document joined")]
    NotJoined,

    /// Operation on a closed session.
    #[error("session closed")]
    Closed,
}

/// Connection state.
#[derive(Debug)]
enum SessionState {
    /// Connected, no document joined yet.
    Connected,
    /// Room membership established.
    Joined {
        document_id: DocumentId,
        user_id: String,
    },
    /// Terminal.
    Closed,
}

/// Entry point for connections into the relay.
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct Relay {
    registry: Arc<RoomRegistry>,
}

impl Relay {
    /// Create a relay with a fresh registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(RoomRegistry::new()))
    }

    /// Create a relay over an existing registry.
    #[must_use]
    pub fn with_registry(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Accept a new connection, assigning it a fresh session id.
    #[must_use]
    pub fn connect(&self) -> RelaySession {
        self.connect_with_id(generate_session_id())
    }

    /// Accept a new connection under a caller-chosen session id.
    #[must_use]
    pub fn connect_with_id(&self, session_id: impl Into<SessionId>) -> RelaySession {
        let session_id = session_id.into();
        debug!(session = %session_id, "Connection accepted");
        RelaySession {
            id: session_id,
            registry: Arc::clone(&self.registry),
            state: SessionState::Connected,
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

/// One live connection's view of the relay.
pub struct RelaySession {
    id: SessionId,
    registry: Arc<RoomRegistry>,
    state: SessionState,
}

impl RelaySession {
    /// This connection's session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check whether the session has joined a document.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        matches!(self.state, SessionState::Joined { .. })
    }

    /// The joined document id, if any.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Joined { document_id, .. } => Some(document_id),
            _ => None,
        }
    }

    /// Join the room for a document.
    ///
    /// Registers the session, announces it to the room, and returns the
    /// current membership snapshot (never including this session) together
    /// with the room's event receiver.
    ///
    /// # Errors
    ///
    /// Returns an error if an identifier is empty, the session already
    /// joined a document, or the session is closed.
    pub fn join(
        &mut self,
        document_id: &str,
        user_id: &str,
        presence: PresenceInfo,
    ) -> Result<(Vec<Participant>, broadcast::Receiver<Arc<RoomEvent>>), RelayError> {
        match &self.state {
            SessionState::Connected => {}
            SessionState::Joined { document_id, .. } => {
                return Err(RelayError::AlreadyJoined(document_id.clone()));
            }
            SessionState::Closed => return Err(RelayError::Closed),
        }

        if document_id.is_empty() || user_id.is_empty() {
            return Err(RelayError::InvalidJoin);
        }

        let receiver = self
            .registry
            .join(document_id, &self.id, user_id, presence.clone());
        let others = self.registry.list_others(document_id, &self.id);

        self.registry.broadcast(
            document_id,
            RoomEvent::PeerJoined {
                session_id: self.id.clone(),
                user_id: user_id.to_string(),
                presence,
            },
        );

        info!(session = %self.id, document = %document_id, user = %user_id, "Session joined");

        self.state = SessionState::Joined {
            document_id: document_id.to_string(),
            user_id: user_id.to_string(),
        };

        Ok((others, receiver))
    }

    /// Relay an opaque document delta to the rest of the room.
    ///
    /// The payload is broadcast verbatim; receivers use the origin tag to
    /// exclude the sender. Returns the number of receivers reached.
    ///
    /// # Errors
    ///
    /// Returns an error if no document is joined.
    pub fn relay_document_delta(&self, payload: Bytes) -> Result<usize, RelayError> {
        let document_id = self.joined_document()?;
        Ok(self.registry.broadcast(
            document_id,
            RoomEvent::DocumentDelta {
                from: self.id.clone(),
                payload,
            },
        ))
    }

    /// Relay a presence delta to the rest of the room, tagged with this
    /// session's id so receivers can attribute it.
    ///
    /// # Errors
    ///
    /// Returns an error if no document is joined.
    pub fn relay_presence_delta(&self, payload: Bytes) -> Result<usize, RelayError> {
        let document_id = self.joined_document()?;
        Ok(self.registry.broadcast(
            document_id,
            RoomEvent::PresenceDelta {
                from: self.id.clone(),
                payload,
            },
        ))
    }

    /// Tear the session down.
    ///
    /// If joined, announces the departure to the room before removing the
    /// session from the registry. Idempotent; the session is terminal
    /// afterwards.
    pub fn disconnect(&mut self) {
        if let SessionState::Joined {
            document_id,
            user_id,
        } = std::mem::replace(&mut self.state, SessionState::Closed)
        {
            self.registry.broadcast(
                &document_id,
                RoomEvent::PeerLeft {
                    session_id: self.id.clone(),
                    user_id,
                },
            );
            self.registry.leave(&self.id);
            info!(session = %self.id, document = %document_id, "Session disconnected");
        }
    }

    fn joined_document(&self) -> Result<&str, RelayError> {
        match &self.state {
            SessionState::Joined { document_id, .. } => Ok(document_id),
            SessionState::Connected => Err(RelayError::NotJoined),
            SessionState::Closed => Err(RelayError::Closed),
        }
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        // A dropped connection must leave no residual registry entry.
        self.disconnect();
    }
}
