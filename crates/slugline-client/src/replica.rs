//! The narrow interface to the local replication layer.
//!
//! Document merging happens in a pre-existing replicated-data-type engine
//! the client does not interpret; from here a delta is just bytes that
//! must reach the replica.

use thiserror::Error;

/// Replica errors.
///
/// Opaque by design; the replication engine's own error detail stays on
/// its side of the seam.
#[derive(Debug, Error)]
#[error("Replica error: {0}")]
pub struct ReplicaError(pub String);

impl ReplicaError {
    /// Create a new replica error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handle to the local document replica.
pub trait Replica: Send + 'static {
    /// Apply an incoming delta to the replica.
    ///
    /// # Errors
    ///
    /// Returns an error if the replica rejects the delta. A failure here
    /// never blocks channel teardown.
    fn apply_delta(&mut self, delta: &[u8]) -> Result<(), ReplicaError>;
}
