//! Delta channel trait.
//!
//! The trait defines the narrow interface the sync client and the relay
//! agree on: frames in, frames out, FIFO per connection, explicit close.

use async_trait::async_trait;
use slugline_protocol::Frame;
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Channel was closed.
    #[error("Channel closed")]
    Closed,

    /// Failed to send a frame.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive a frame.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Protocol error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] slugline_protocol::ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// A bidirectional frame transport for one client connection.
///
/// Implementations must preserve frame order end-to-end (FIFO per
/// connection); no ordering is guaranteed across different channels.
#[async_trait]
pub trait DeltaChannel: Send {
    /// Receive the next frame.
    ///
    /// Returns `None` if the channel closed cleanly.
    async fn recv(&mut self) -> Result<Option<Frame>, ChannelError>;

    /// Send a frame.
    async fn send(&mut self, frame: Frame) -> Result<(), ChannelError>;

    /// Close the channel gracefully. Must be safe to call more than once.
    async fn close(&mut self) -> Result<(), ChannelError>;

    /// Check if the channel is still open.
    fn is_open(&self) -> bool;

    /// Get the remote address, if the transport has one.
    fn remote_addr(&self) -> Option<String> {
        None
    }
}
