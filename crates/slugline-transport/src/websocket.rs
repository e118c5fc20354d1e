//! WebSocket delta channel.
//!
//! Client-side channel over tokio-tungstenite, speaking the
//! length-prefixed MessagePack framing from `slugline-protocol`.

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use slugline_protocol::{codec, Frame};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, warn};

use crate::traits::{ChannelError, DeltaChannel};

/// Maximum accepted WebSocket message size (matches the relay's limit).
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A WebSocket delta channel.
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    remote: String,
    read_buffer: BytesMut,
    open: bool,
}

impl WebSocketChannel {
    /// Connect to a relay endpoint, e.g. `ws://localhost:8080/ws`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or handshake fails.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (stream, _response) = connect_async(url).await.map_err(|e| {
            error!("WebSocket handshake failed: {}", e);
            ChannelError::Other(format!("WebSocket handshake failed: {}", e))
        })?;

        debug!("WebSocket connected to {}", url);

        Ok(Self {
            stream,
            remote: url.to_string(),
            read_buffer: BytesMut::with_capacity(4096),
            open: true,
        })
    }
}

#[async_trait]
impl DeltaChannel for WebSocketChannel {
    async fn recv(&mut self) -> Result<Option<Frame>, ChannelError> {
        // First, try to decode from the existing buffer
        if let Some(frame) = codec::decode_from(&mut self.read_buffer)? {
            return Ok(Some(frame));
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    if data.len() > MAX_MESSAGE_SIZE {
                        warn!(
                            "Message too large: {} bytes (max: {})",
                            data.len(),
                            MAX_MESSAGE_SIZE
                        );
                        return Err(ChannelError::Protocol(
                            slugline_protocol::ProtocolError::FrameTooLarge(data.len()),
                        ));
                    }

                    self.read_buffer.extend_from_slice(&data);

                    if let Some(frame) = codec::decode_from(&mut self.read_buffer)? {
                        return Ok(Some(frame));
                    }
                    // Need more data, continue reading
                }
                Some(Ok(Message::Text(text))) => {
                    // For compatibility, treat text as binary
                    self.read_buffer.extend_from_slice(text.as_bytes());

                    if let Some(frame) = codec::decode_from(&mut self.read_buffer)? {
                        return Ok(Some(frame));
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        warn!("Failed to send pong: {}", e);
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    // Ignore pong messages
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("Received close frame");
                    self.open = false;
                    return Ok(None);
                }
                Some(Ok(Message::Frame(_))) => {
                    // Raw frame, ignore
                }
                Some(Err(WsError::ConnectionClosed)) => {
                    debug!("Connection closed");
                    self.open = false;
                    return Ok(None);
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    self.open = false;
                    return Err(ChannelError::ReceiveFailed(e.to_string()));
                }
                None => {
                    debug!("WebSocket stream ended");
                    self.open = false;
                    return Ok(None);
                }
            }
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }

        let data = codec::encode(&frame)?;
        self.stream
            .send(Message::Binary(data.to_vec()))
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if !self.open {
            return Ok(()); // Already closed
        }
        self.open = false;

        self.stream
            .close(None)
            .await
            .map_err(|e| ChannelError::Other(format!("Failed to close: {}", e)))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn remote_addr(&self) -> Option<String> {
        Some(self.remote.clone())
    }
}
