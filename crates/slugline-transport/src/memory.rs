//! In-process delta channel.
//!
//! A crossed pair of unbounded queues, useful for exercising the sync
//! client and relay in one process without sockets. Preserves FIFO order
//! like any other channel.

use async_trait::async_trait;
use slugline_protocol::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use crate::traits::{ChannelError, DeltaChannel};

/// One end of an in-process channel pair.
pub struct MemoryChannel {
    sender: Option<mpsc::UnboundedSender<Frame>>,
    receiver: mpsc::UnboundedReceiver<Frame>,
}

/// Create a connected pair of in-process channels.
///
/// Frames sent on one end arrive on the other, in order.
#[must_use]
pub fn memory_pair() -> (MemoryChannel, MemoryChannel) {
    let (tx_a, rx_a) = mpsc::unbounded_channel();
    let (tx_b, rx_b) = mpsc::unbounded_channel();

    (
        MemoryChannel {
            sender: Some(tx_a),
            receiver: rx_b,
        },
        MemoryChannel {
            sender: Some(tx_b),
            receiver: rx_a,
        },
    )
}

#[async_trait]
impl DeltaChannel for MemoryChannel {
    async fn recv(&mut self) -> Result<Option<Frame>, ChannelError> {
        // None once the peer's sender is gone and the queue drained.
        Ok(self.receiver.recv().await)
    }

    async fn send(&mut self, frame: Frame) -> Result<(), ChannelError> {
        let sender = self.sender.as_ref().ok_or(ChannelError::Closed)?;
        sender
            .send(frame)
            .map_err(|_| ChannelError::SendFailed("peer dropped".into()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.sender.take().is_some() {
            debug!("Memory channel closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.sender.is_some()
    }

    fn remote_addr(&self) -> Option<String> {
        Some("memory".to_string())
    }
}
