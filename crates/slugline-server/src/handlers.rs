//! Connection handlers for the relay.
//!
//! This module owns the WebSocket lifecycle: welcome, join, delta
//! fan-out, and disconnect cleanup.

use crate::config::Config;
use crate::metrics::{self, SessionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use slugline_core::{
    RegistryConfig, Relay, RelayError, RelaySession, RoomEvent, RoomRegistry,
};
use slugline_protocol::frames::{ERR_ALREADY_JOINED, ERR_INVALID_JOIN, ERR_NOT_JOINED};
use slugline_protocol::{codec, Frame, Participant};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The session relay.
    pub relay: Relay,
    /// Server configuration.
    pub config: Config,
    /// Live session count, for the max_sessions limit.
    active_sessions: AtomicUsize,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(RoomRegistry::with_config(RegistryConfig {
            room_capacity: config.limits.room_capacity,
        }));

        Self {
            relay: Relay::with_registry(registry),
            config,
            active_sessions: AtomicUsize::new(0),
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("slugline relay listening on {}", addr);
    info!("WebSocket endpoint: ws://{}{}", addr, config.websocket_path);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    if state.active_sessions.fetch_add(1, Ordering::SeqCst) >= state.config.limits.max_sessions {
        state.active_sessions.fetch_sub(1, Ordering::SeqCst);
        warn!("Session limit reached, refusing connection");
        metrics::record_error("session_limit");
        let _ = socket.close().await;
        return;
    }

    let _metrics_guard = SessionMetricsGuard::new();

    let mut session = state.relay.connect();
    debug!(session = %session.id(), "WebSocket connected");

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Greet with the assigned session id
    let welcome = Frame::welcome(session.id(), state.config.heartbeat.interval_ms as u32);
    if let Ok(data) = codec::encode(&welcome) {
        if sender.send(Message::Binary(data.to_vec())).await.is_err() {
            error!(session = %session.id(), "Failed to send welcome frame");
            state.active_sessions.fetch_sub(1, Ordering::SeqCst);
            return;
        }
    }

    // Read buffer for partial frames
    let mut read_buffer = BytesMut::with_capacity(4096);

    // Room events reach the socket through this queue; the forwarding
    // task is spawned on join and aborted on disconnect.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Arc<RoomEvent>>();
    let mut forward_task: Option<tokio::task::JoinHandle<()>> = None;

    // Frame processing loop
    'conn: loop {
        tokio::select! {
            biased;

            // Deliver room events to the socket
            Some(event) = event_rx.recv() => {
                // Room minus sender: skip events this session originated.
                if event.origin() == session.id() {
                    continue;
                }
                let frame = frame_for_event(&event);
                if let Ok(data) = codec::encode(&frame) {
                    if sender.send(Message::Binary(data.to_vec())).await.is_err() {
                        break;
                    }
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        if data.len() > state.config.limits.max_message_size {
                            warn!(session = %session.id(), size = data.len(), "Oversized message");
                            metrics::record_error("oversize");
                            break;
                        }

                        let start = Instant::now();
                        read_buffer.extend_from_slice(&data);

                        loop {
                            match codec::decode_from(&mut read_buffer) {
                                Ok(Some(frame)) => {
                                    if let Err(e) = handle_frame(
                                        frame,
                                        &mut session,
                                        &state,
                                        &mut sender,
                                        &mut forward_task,
                                        &event_tx,
                                    ).await {
                                        error!(session = %session.id(), error = %e, "Frame handling error");
                                        break 'conn;
                                    }
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    warn!(session = %session.id(), error = %e, "Protocol error");
                                    metrics::record_error("protocol");
                                    break 'conn;
                                }
                            }
                        }

                        metrics::record_latency(start.elapsed().as_secs_f64());
                    }
                    Some(Ok(Message::Text(text))) => {
                        // Treat text as binary
                        read_buffer.extend_from_slice(text.as_bytes());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(session = %session.id(), "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(session = %session.id(), error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(session = %session.id(), "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: stop forwarding room events
    if let Some(handle) = forward_task {
        handle.abort();
    }

    // Cleanup: announce the departure and release registry state
    session.disconnect();
    state.active_sessions.fetch_sub(1, Ordering::SeqCst);
    metrics::set_active_rooms(state.relay.registry().stats().room_count);

    debug!(session = %session.id(), "WebSocket disconnected");
}

/// Handle a decoded frame.
async fn handle_frame(
    frame: Frame,
    session: &mut RelaySession,
    state: &Arc<AppState>,
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    forward_task: &mut Option<tokio::task::JoinHandle<()>>,
    event_tx: &mpsc::UnboundedSender<Arc<RoomEvent>>,
) -> Result<()> {
    match frame {
        Frame::JoinDocument {
            document_id,
            user_id,
            presence,
        } => {
            debug!(session = %session.id(), document = %document_id, user = %user_id, "Join request");

            match session.join(&document_id, &user_id, presence) {
                Ok((others, mut room_rx)) => {
                    // Forward room events from broadcast to the socket queue
                    let tx = event_tx.clone();
                    let handle = tokio::spawn(async move {
                        loop {
                            match room_rx.recv().await {
                                Ok(event) => {
                                    if tx.send(event).is_err() {
                                        break; // Receiver dropped
                                    }
                                }
                                Err(broadcast::error::RecvError::Closed) => break,
                                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                    warn!(skipped, "Room event receiver lagging");
                                    continue;
                                }
                            }
                        }
                    });
                    *forward_task = Some(handle);

                    metrics::set_active_rooms(state.relay.registry().stats().room_count);
                    send_frame(sender, &Frame::current_users(others)).await?;
                }
                Err(e) => {
                    warn!(session = %session.id(), error = %e, "Join rejected");
                    metrics::record_error("join");
                    send_frame(sender, &Frame::error(error_code(&e), e.to_string())).await?;
                }
            }
        }

        Frame::DocumentDelta { payload, .. } => {
            let size = payload.len();
            match session.relay_document_delta(Bytes::from(payload)) {
                Ok(count) => {
                    metrics::record_delta("document", size);
                    debug!(session = %session.id(), recipients = count, "Relayed document delta");
                }
                Err(e) => {
                    metrics::record_error("delta");
                    send_frame(sender, &Frame::error(error_code(&e), e.to_string())).await?;
                }
            }
        }

        Frame::PresenceDelta { payload, .. } => {
            let size = payload.len();
            match session.relay_presence_delta(Bytes::from(payload)) {
                Ok(count) => {
                    metrics::record_delta("presence", size);
                    debug!(session = %session.id(), recipients = count, "Relayed presence delta");
                }
                Err(e) => {
                    metrics::record_error("delta");
                    send_frame(sender, &Frame::error(error_code(&e), e.to_string())).await?;
                }
            }
        }

        Frame::Ping { timestamp } => {
            send_frame(sender, &Frame::pong(timestamp)).await?;
        }

        Frame::Pong { .. } => {
            // Keepalive answer, nothing to do
        }

        other => {
            warn!(session = %session.id(), frame_type = ?other.frame_type(), "Unexpected frame type");
        }
    }

    Ok(())
}

/// Map a relay error to its wire code.
fn error_code(error: &RelayError) -> u16 {
    match error {
        RelayError::InvalidJoin => ERR_INVALID_JOIN,
        RelayError::AlreadyJoined(_) => ERR_ALREADY_JOINED,
        RelayError::NotJoined | RelayError::Closed => ERR_NOT_JOINED,
    }
}

/// Translate a room event into its wire frame.
fn frame_for_event(event: &RoomEvent) -> Frame {
    match event {
        RoomEvent::PeerJoined {
            session_id,
            user_id,
            presence,
        } => Frame::user_joined(Participant::new(
            session_id.clone(),
            user_id.clone(),
            presence.clone(),
        )),
        RoomEvent::PeerLeft {
            session_id,
            user_id,
        } => Frame::user_left(session_id.clone(), user_id.clone()),
        RoomEvent::DocumentDelta { from, payload } => {
            Frame::document_delta_from(from.clone(), payload.to_vec())
        }
        RoomEvent::PresenceDelta { from, payload } => {
            Frame::presence_delta_from(from.clone(), payload.to_vec())
        }
    }
}

/// Send a frame to the WebSocket.
async fn send_frame(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    frame: &Frame,
) -> Result<()> {
    let data = codec::encode(frame)?;
    sender.send(Message::Binary(data.to_vec())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slugline_protocol::PresenceInfo;

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code(&RelayError::InvalidJoin), ERR_INVALID_JOIN);
        assert_eq!(
            error_code(&RelayError::AlreadyJoined("doc1".into())),
            ERR_ALREADY_JOINED
        );
        assert_eq!(error_code(&RelayError::NotJoined), ERR_NOT_JOINED);
    }

    #[test]
    fn test_frame_for_event_tags_sender() {
        let event = RoomEvent::DocumentDelta {
            from: "sess-1".into(),
            payload: Bytes::from_static(b"delta"),
        };

        match frame_for_event(&event) {
            Frame::DocumentDelta { from, payload } => {
                assert_eq!(from.as_deref(), Some("sess-1"));
                assert_eq!(payload, b"delta");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_frame_for_peer_joined() {
        let event = RoomEvent::PeerJoined {
            session_id: "sess-2".into(),
            user_id: "ben".into(),
            presence: PresenceInfo::new().with_name("Ben"),
        };

        match frame_for_event(&event) {
            Frame::UserJoined { user } => {
                assert_eq!(user.session_id, "sess-2");
                assert_eq!(user.user_id, "ben");
                assert_eq!(user.presence.name(), Some("Ben"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
