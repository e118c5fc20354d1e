//! The sync client.
//!
//! Wraps one delta channel plus the opaque local replica. An internal I/O
//! task owns both: it pumps outgoing frames onto the channel and routes
//! incoming frames to the replica, the presence map, and the caller's
//! event stream.

use crate::color::color_for_user;
use crate::debounce::Debouncer;
use crate::replica::Replica;
use slugline_protocol::{Frame, Participant, PresenceInfo};
use slugline_transport::{ChannelError, DeltaChannel};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default outbound throttle window.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(200);

/// Sync client options.
#[derive(Debug, Clone)]
pub struct SyncClientOptions {
    /// Trailing-edge throttle window for outgoing document deltas.
    pub throttle_window: Duration,
}

impl Default for SyncClientOptions {
    fn default() -> Self {
        Self {
            throttle_window: DEFAULT_THROTTLE_WINDOW,
        }
    }
}

/// Lifecycle and presence notifications, drained by the caller.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The relay acknowledged the connection.
    Connected {
        /// Session ID the relay assigned to this connection.
        session_id: String,
    },
    /// The join was accepted; `others` is the room snapshot.
    JoinAccepted {
        /// Every other member of the room at join time.
        others: Vec<Participant>,
    },
    /// A peer entered the room.
    PeerJoined {
        /// The new member.
        user: Participant,
    },
    /// A peer left the room.
    PeerLeft {
        /// Session ID of the departed peer.
        session_id: String,
        /// User ID of the departed peer.
        user_id: String,
    },
    /// The local presence map changed; see [`SyncClient::presence_snapshot`].
    PresenceChanged,
    /// The relay reported a protocol error.
    ProtocolError {
        /// Error code.
        code: u16,
        /// Error message.
        message: String,
    },
    /// The replica rejected an incoming delta.
    ReplicaError {
        /// Replica error message.
        message: String,
    },
    /// The channel closed; no further events follow.
    Closed,
}

/// Editor-side counterpart of the relay.
pub struct SyncClient {
    out: mpsc::UnboundedSender<Frame>,
    debouncer: Debouncer<Frame>,
    presence: Arc<RwLock<HashMap<String, PresenceInfo>>>,
    session_id: Arc<RwLock<Option<String>>>,
    shutdown: Option<oneshot::Sender<()>>,
    io_task: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Start a client over an already-open channel.
    ///
    /// Spawns the I/O task and returns the client handle together with
    /// the event stream. After this returns it is safe to call
    /// [`join`](Self::join).
    #[must_use]
    pub fn start(
        channel: Box<dyn DeltaChannel>,
        replica: Box<dyn Replica>,
        options: SyncClientOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let presence = Arc::new(RwLock::new(HashMap::new()));
        let session_id = Arc::new(RwLock::new(None));

        let io_task = tokio::spawn(run_io(
            channel,
            replica,
            out_rx,
            shutdown_rx,
            event_tx,
            Arc::clone(&presence),
            Arc::clone(&session_id),
        ));

        let client = Self {
            debouncer: Debouncer::new(options.throttle_window, out_tx.clone()),
            out: out_tx,
            presence,
            session_id,
            shutdown: Some(shutdown_tx),
            io_task: Some(io_task),
        };

        (client, event_rx)
    }

    /// Join the room for a document.
    ///
    /// Presence defaults are filled in: the display name falls back to
    /// the user id, and the color to the deterministic per-user palette
    /// pick, so peers render this user consistently without coordination.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is already closed.
    pub fn join(
        &self,
        document_id: &str,
        user_id: &str,
        presence: PresenceInfo,
    ) -> Result<(), ChannelError> {
        let mut presence = presence;
        if presence.name().is_none() {
            presence = presence.with_name(user_id);
        }
        if presence.color().is_none() {
            presence = presence.with_color(color_for_user(user_id));
        }

        self.out
            .send(Frame::join_document(document_id, user_id, presence))
            .map_err(|_| ChannelError::Closed)
    }

    /// Queue an outgoing document delta.
    ///
    /// Deltas are coalesced by the trailing-edge throttle: within one
    /// window only the latest delta is sent, since the replica encodes
    /// cumulative state. The call never blocks.
    pub fn queue_delta(&self, delta: Vec<u8>) {
        self.debouncer.push(Frame::document_delta(delta));
    }

    /// Send a presence update. Unthrottled; presence traffic is light.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the client is closed.
    pub fn send_presence(&self, presence: &PresenceInfo) -> Result<(), ChannelError> {
        let payload = presence.to_bytes()?;
        self.out
            .send(Frame::presence_delta(payload))
            .map_err(|_| ChannelError::Closed)
    }

    /// Session ID assigned by the relay, once the welcome arrived.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().unwrap().clone()
    }

    /// Snapshot of peer presence, keyed by session id.
    #[must_use]
    pub fn presence_snapshot(&self) -> HashMap<String, PresenceInfo> {
        self.presence.read().unwrap().clone()
    }

    /// Tear the client down: cancel the pending throttled delta, close
    /// the channel, release the replica. Safe to call more than once.
    pub async fn close(&mut self) {
        self.debouncer.cancel();

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(io_task) = self.io_task.take() {
            let _ = io_task.await;
        }
    }
}

async fn run_io(
    mut channel: Box<dyn DeltaChannel>,
    mut replica: Box<dyn Replica>,
    mut out_rx: mpsc::UnboundedReceiver<Frame>,
    mut shutdown_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<ClientEvent>,
    presence: Arc<RwLock<HashMap<String, PresenceInfo>>>,
    session_id: Arc<RwLock<Option<String>>>,
) {
    loop {
        tokio::select! {
            biased;

            // Fires on close() and when the client handle is dropped.
            _ = &mut shutdown_rx => {
                let _ = channel.close().await;
                break;
            }

            maybe_frame = out_rx.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        if let Err(e) = channel.send(frame).await {
                            warn!(error = %e, "Outbound send failed");
                            break;
                        }
                    }
                    None => break,
                }
            }

            result = channel.recv() => {
                match result {
                    Ok(Some(frame)) => {
                        handle_frame(
                            frame,
                            &mut channel,
                            &mut replica,
                            &events,
                            &presence,
                            &session_id,
                        )
                        .await;
                    }
                    Ok(None) => {
                        debug!("Channel closed by peer");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Channel receive failed");
                        break;
                    }
                }
            }
        }
    }

    let _ = events.send(ClientEvent::Closed);
}

async fn handle_frame(
    frame: Frame,
    channel: &mut Box<dyn DeltaChannel>,
    replica: &mut Box<dyn Replica>,
    events: &mpsc::UnboundedSender<ClientEvent>,
    presence: &Arc<RwLock<HashMap<String, PresenceInfo>>>,
    session_id: &Arc<RwLock<Option<String>>>,
) {
    match frame {
        Frame::Welcome {
            session_id: assigned,
            ..
        } => {
            *session_id.write().unwrap() = Some(assigned.clone());
            let _ = events.send(ClientEvent::Connected {
                session_id: assigned,
            });
        }

        Frame::CurrentUsers { users } => {
            {
                let mut map = presence.write().unwrap();
                for user in &users {
                    map.insert(user.session_id.clone(), user.presence.clone());
                }
            }
            let _ = events.send(ClientEvent::JoinAccepted { others: users });
            let _ = events.send(ClientEvent::PresenceChanged);
        }

        Frame::UserJoined { user } => {
            presence
                .write()
                .unwrap()
                .insert(user.session_id.clone(), user.presence.clone());
            let _ = events.send(ClientEvent::PeerJoined { user });
            let _ = events.send(ClientEvent::PresenceChanged);
        }

        Frame::UserLeft {
            session_id: peer,
            user_id,
        } => {
            presence.write().unwrap().remove(&peer);
            let _ = events.send(ClientEvent::PeerLeft {
                session_id: peer,
                user_id,
            });
            let _ = events.send(ClientEvent::PresenceChanged);
        }

        // Incoming document deltas apply immediately; only the outbound
        // path is throttled.
        Frame::DocumentDelta { payload, .. } => {
            if let Err(e) = replica.apply_delta(&payload) {
                warn!(error = %e, "Replica rejected delta");
                let _ = events.send(ClientEvent::ReplicaError {
                    message: e.to_string(),
                });
            }
        }

        Frame::PresenceDelta { from, payload } => {
            let Some(from) = from else {
                warn!("Presence delta without sender attribution");
                return;
            };
            match PresenceInfo::from_bytes(&payload) {
                Ok(update) => {
                    presence
                        .write()
                        .unwrap()
                        .entry(from)
                        .or_default()
                        .merge(&update);
                    let _ = events.send(ClientEvent::PresenceChanged);
                }
                Err(e) => warn!(error = %e, "Undecodable presence delta"),
            }
        }

        Frame::Ping { timestamp } => {
            if let Err(e) = channel.send(Frame::pong(timestamp)).await {
                warn!(error = %e, "Failed to send pong");
            }
        }

        Frame::Error { code, message } => {
            warn!(code, message = %message, "Relay reported an error");
            let _ = events.send(ClientEvent::ProtocolError { code, message });
        }

        Frame::Pong { .. } => {}

        other => {
            warn!(frame_type = ?other.frame_type(), "Unexpected frame from relay");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slugline_protocol::codec;
    use slugline_transport::{memory_pair, MemoryChannel};
    use std::sync::Mutex;

    struct NullReplica;

    impl Replica for NullReplica {
        fn apply_delta(&mut self, _delta: &[u8]) -> Result<(), crate::ReplicaError> {
            Ok(())
        }
    }

    struct RecordingReplica {
        applied: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Replica for RecordingReplica {
        fn apply_delta(&mut self, delta: &[u8]) -> Result<(), crate::ReplicaError> {
            self.applied.lock().unwrap().push(delta.to_vec());
            Ok(())
        }
    }

    struct FailingReplica;

    impl Replica for FailingReplica {
        fn apply_delta(&mut self, _delta: &[u8]) -> Result<(), crate::ReplicaError> {
            Err(crate::ReplicaError::new("corrupt state vector"))
        }
    }

    fn start_client(
        replica: Box<dyn Replica>,
    ) -> (SyncClient, mpsc::UnboundedReceiver<ClientEvent>, MemoryChannel) {
        let (client_end, server_end) = memory_pair();
        let (client, events) =
            SyncClient::start(Box::new(client_end), replica, SyncClientOptions::default());
        (client, events, server_end)
    }

    /// Wait for the recording replica to observe `count` deltas without
    /// advancing the clock; incoming deltas must not be throttled.
    async fn wait_for_applied(applied: &Arc<Mutex<Vec<Vec<u8>>>>, count: usize) {
        for _ in 0..100 {
            if applied.lock().unwrap().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("replica never saw {count} deltas");
    }

    #[tokio::test]
    async fn test_join_fills_presence_defaults() {
        let (client, _events, mut server) = start_client(Box::new(NullReplica));

        client.join("doc1", "ada", PresenceInfo::new()).unwrap();

        match server.recv().await.unwrap().unwrap() {
            Frame::JoinDocument {
                document_id,
                user_id,
                presence,
            } => {
                assert_eq!(document_id, "doc1");
                assert_eq!(user_id, "ada");
                assert_eq!(presence.name(), Some("ada"));
                assert_eq!(presence.color(), Some(color_for_user("ada")));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_keeps_explicit_presence() {
        let (client, _events, mut server) = start_client(Box::new(NullReplica));

        let explicit = PresenceInfo::new().with_name("Ada L.").with_color("#123456");
        client.join("doc1", "ada", explicit).unwrap();

        match server.recv().await.unwrap().unwrap() {
            Frame::JoinDocument { presence, .. } => {
                assert_eq!(presence.name(), Some("Ada L."));
                assert_eq!(presence.color(), Some("#123456"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_sends_once_per_window() {
        let (client, _events, mut server) = start_client(Box::new(NullReplica));

        // 5 rapid deltas within the window: exactly one send, latest wins.
        for i in 0..5u8 {
            client.queue_delta(vec![i]);
        }
        tokio::task::yield_now().await;
        tokio::time::advance(DEFAULT_THROTTLE_WINDOW + Duration::from_millis(10)).await;

        match server.recv().await.unwrap().unwrap() {
            Frame::DocumentDelta { payload, .. } => assert_eq!(payload, vec![4]),
            other => panic!("unexpected frame: {other:?}"),
        }

        // A 6th delta after the window closes results in a second send.
        client.queue_delta(vec![5]);
        tokio::task::yield_now().await;
        tokio::time::advance(DEFAULT_THROTTLE_WINDOW + Duration::from_millis(10)).await;

        match server.recv().await.unwrap().unwrap() {
            Frame::DocumentDelta { payload, .. } => assert_eq!(payload, vec![5]),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_incoming_delta_applies_without_delay() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let replica = RecordingReplica {
            applied: Arc::clone(&applied),
        };
        let (_client, _events, mut server) = start_client(Box::new(replica));

        server
            .send(Frame::document_delta_from("sess-peer", b"delta-1".to_vec()))
            .await
            .unwrap();

        // No clock advance: the inbound path is unthrottled.
        wait_for_applied(&applied, 1).await;
        assert_eq!(applied.lock().unwrap()[0], b"delta-1");
    }

    #[tokio::test]
    async fn test_peer_lifecycle_maintains_presence_map() {
        let (client, mut events, mut server) = start_client(Box::new(NullReplica));

        server.send(Frame::welcome("sess-me", 30_000)).await.unwrap();
        match events.recv().await.unwrap() {
            ClientEvent::Connected { session_id } => assert_eq!(session_id, "sess-me"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(client.session_id().as_deref(), Some("sess-me"));

        let ben = Participant::new("sess-ben", "ben", PresenceInfo::new().with_name("Ben"));
        server.send(Frame::user_joined(ben)).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::PeerJoined { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::PresenceChanged
        ));
        assert!(client.presence_snapshot().contains_key("sess-ben"));

        // A presence delta merges into the existing entry.
        let update = PresenceInfo::new().with_color("#4db6ac");
        server
            .send(Frame::presence_delta_from("sess-ben", update.to_bytes().unwrap()))
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::PresenceChanged
        ));
        let snapshot = client.presence_snapshot();
        let entry = snapshot.get("sess-ben").unwrap();
        assert_eq!(entry.name(), Some("Ben"));
        assert_eq!(entry.color(), Some("#4db6ac"));

        // Departure removes the entry.
        server.send(Frame::user_left("sess-ben", "ben")).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::PeerLeft { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::PresenceChanged
        ));
        assert!(!client.presence_snapshot().contains_key("sess-ben"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_delta() {
        let (mut client, mut events, mut server) = start_client(Box::new(NullReplica));

        client.queue_delta(b"never sent".to_vec());
        client.close().await;
        client.close().await; // idempotent

        tokio::time::advance(DEFAULT_THROTTLE_WINDOW * 2).await;

        // The peer sees a clean close, never the throttled delta.
        assert!(server.recv().await.unwrap().is_none());

        // The event stream ends with Closed.
        let mut saw_closed = false;
        while let Some(event) = events.recv().await {
            if matches!(event, ClientEvent::Closed) {
                saw_closed = true;
            }
        }
        assert!(saw_closed);
    }

    #[tokio::test]
    async fn test_replica_failure_does_not_kill_client() {
        let (_client, mut events, mut server) = start_client(Box::new(FailingReplica));

        server
            .send(Frame::document_delta_from("sess-peer", b"bad".to_vec()))
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::ReplicaError { .. }
        ));

        // The client still answers pings afterwards.
        server.send(Frame::ping(Some(7))).await.unwrap();
        match server.recv().await.unwrap().unwrap() {
            Frame::Pong { timestamp } => assert_eq!(timestamp, Some(7)),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_frames_survive_codec() {
        // The client and relay meet through the codec; make sure the
        // frames this module produces encode cleanly.
        let frame = Frame::join_document(
            "doc1",
            "ada",
            PresenceInfo::new()
                .with_name("ada")
                .with_color(color_for_user("ada")),
        );
        let encoded = codec::encode(&frame).unwrap();
        assert_eq!(codec::decode(&encoded).unwrap(), frame);
    }
}
