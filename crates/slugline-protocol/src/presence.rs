//! Presence types shared between the relay and its clients.
//!
//! Presence is ephemeral per-user metadata (display name, color, cursor)
//! broadcast outside the replicated document content. The relay stores and
//! forwards it but never interprets anything beyond the two well-known keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::ProtocolError;

/// Well-known presence key for the display name.
pub const KEY_NAME: &str = "name";

/// Well-known presence key for the display color.
pub const KEY_COLOR: &str = "color";

/// Free-form presence metadata for one user.
///
/// A string-keyed map of JSON values. Consumers should treat unknown keys
/// as opaque and forward them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceInfo(BTreeMap<String, serde_json::Value>);

impl PresenceInfo {
    /// Create empty presence info.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the display name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.get(KEY_NAME).and_then(|v| v.as_str())
    }

    /// Get the display color, if set.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.0.get(KEY_COLOR).and_then(|v| v.as_str())
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.0
            .insert(KEY_NAME.to_string(), serde_json::Value::String(name.into()));
        self
    }

    /// Set the display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.0.insert(
            KEY_COLOR.to_string(),
            serde_json::Value::String(color.into()),
        );
        self
    }

    /// Insert an arbitrary key/value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Check whether a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Check whether any metadata is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another presence map into this one, newer keys winning.
    pub fn merge(&mut self, other: &PresenceInfo) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Encode to the MessagePack payload carried inside presence deltas.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decode from a presence delta payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid MessagePack.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// One member of a room, as reported to peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Session ID of the connection.
    pub session_id: String,
    /// User ID behind the session.
    pub user_id: String,
    /// Presence metadata the user joined with.
    pub presence: PresenceInfo,
}

impl Participant {
    /// Create a new participant record.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        presence: PresenceInfo,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            presence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence_well_known_keys() {
        let info = PresenceInfo::new().with_name("Ada").with_color("#e57373");

        assert_eq!(info.name(), Some("Ada"));
        assert_eq!(info.color(), Some("#e57373"));
        assert!(!info.is_empty());
    }

    #[test]
    fn test_presence_merge_overwrites() {
        let mut base = PresenceInfo::new().with_name("Ada");
        base.insert("cursor", json!({"line": 3}));

        let update = PresenceInfo::new().with_name("Ada L.");
        base.merge(&update);

        assert_eq!(base.name(), Some("Ada L."));
        assert_eq!(base.get("cursor"), Some(&json!({"line": 3})));
    }

    #[test]
    fn test_presence_payload_roundtrip() {
        let info = PresenceInfo::new().with_name("Ada").with_color("#64b5f6");

        let bytes = info.to_bytes().unwrap();
        let decoded = PresenceInfo::from_bytes(&bytes).unwrap();
        assert_eq!(info, decoded);
    }
}
