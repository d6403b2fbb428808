//! WebSocket client session management.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use uuid::Uuid;

use renraku_server::infrastructure::dto::http::{ConversationSummaryDto, MessageDto};
use renraku_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::{
    dedup::MessageDeduper,
    error::ClientError,
    reconnect::{self, ConnectionState, ReconnectPolicy},
    room::RoomGuard,
    typing::TypingNotifier,
};

/// Deadline for one WebSocket connect attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const SUBSCRIPTION_BUFFER: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection parameters for a [`ChatSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint (e.g., "ws://127.0.0.1:8080/ws")
    pub ws_url: String,
    pub user_id: String,
    /// Opaque credential, carried in the handshake query only
    pub token: String,
    pub policy: ReconnectPolicy,
}

/// Presence change republished to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Initial snapshot from `session-ready`
    Snapshot(Vec<String>),
    Online(String),
    Offline(String),
}

/// Typing signal republished to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEvent {
    pub conversation_id: String,
    pub user_id: String,
    pub typing: bool,
}

/// State shared between the session handle and its runner task.
struct SessionShared {
    /// オンライン集合は session-ready のスナップショットを起点に
    /// user-online / user-offline だけで維持する
    known_online: StdMutex<HashSet<String>>,
    /// 開いている会話。再接続時の再 join に使う
    open_rooms: Arc<StdMutex<HashSet<String>>>,
    dedup: StdMutex<MessageDeduper>,
}

struct Channels {
    presence: broadcast::Sender<PresenceEvent>,
    messages: broadcast::Sender<MessageDto>,
    summaries: broadcast::Sender<ConversationSummaryDto>,
    typing: broadcast::Sender<TypingEvent>,
}

/// One authenticated realtime session: exactly one WebSocket connection,
/// reconnected with bounded backoff, publishing typed event streams.
pub struct ChatSession {
    user_id: String,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    state_rx: watch::Receiver<ConnectionState>,
    channels: Arc<Channels>,
    shared: Arc<SessionShared>,
    runner: tokio::task::JoinHandle<()>,
}

impl ChatSession {
    /// Connect and wait for the first connection to be established.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is rejected or the first
    /// connection cannot be established within the reconnect policy.
    pub async fn connect(config: SessionConfig) -> Result<Self, ClientError> {
        let user_id = config.user_id.clone();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Reconnecting { attempt: 0 });
        let channels = Arc::new(Channels {
            presence: broadcast::channel(SUBSCRIPTION_BUFFER).0,
            messages: broadcast::channel(SUBSCRIPTION_BUFFER).0,
            summaries: broadcast::channel(SUBSCRIPTION_BUFFER).0,
            typing: broadcast::channel(SUBSCRIPTION_BUFFER).0,
        });
        let shared = Arc::new(SessionShared {
            known_online: StdMutex::new(HashSet::new()),
            open_rooms: Arc::new(StdMutex::new(HashSet::new())),
            dedup: StdMutex::new(MessageDeduper::default()),
        });
        let (ready_tx, ready_rx) = oneshot::channel();

        let runner = tokio::spawn(run_session(
            config,
            outbound_rx,
            state_tx,
            channels.clone(),
            shared.clone(),
            ready_tx,
        ));

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                user_id,
                outbound: outbound_tx,
                state_rx,
                channels,
                shared,
                runner,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::ConnectionError(
                "session ended before connecting".to_string(),
            )),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch channel for connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Check the known-online set maintained from the presence events.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.shared
            .known_online
            .lock()
            .expect("known_online lock poisoned")
            .contains(user_id)
    }

    pub fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .shared
            .known_online
            .lock()
            .expect("known_online lock poisoned")
            .iter()
            .cloned()
            .collect();
        users.sort();
        users
    }

    pub fn subscribe_presence(&self) -> broadcast::Receiver<PresenceEvent> {
        self.channels.presence.subscribe()
    }

    pub fn subscribe_messages(&self) -> broadcast::Receiver<MessageDto> {
        self.channels.messages.subscribe()
    }

    pub fn subscribe_summaries(&self) -> broadcast::Receiver<ConversationSummaryDto> {
        self.channels.summaries.subscribe()
    }

    pub fn subscribe_typing(&self) -> broadcast::Receiver<TypingEvent> {
        self.channels.typing.subscribe()
    }

    /// Open a conversation: joins the room now and leaves it when the
    /// returned guard is dropped.
    pub fn open_conversation(&self, conversation_id: &str) -> RoomGuard {
        RoomGuard::new(
            conversation_id.to_string(),
            self.outbound.clone(),
            self.shared.open_rooms.clone(),
        )
    }

    /// Typing notifier for a conversation.
    pub fn typing_notifier(&self, conversation_id: &str) -> TypingNotifier {
        TypingNotifier::new(self.outbound.clone(), conversation_id.to_string())
    }

    /// Record the id of a message this client just posted over REST, so the
    /// WebSocket echo of it is dropped by the dedup window.
    pub fn note_local_message(&self, id: Uuid) {
        self.shared
            .dedup
            .lock()
            .expect("dedup lock poisoned")
            .observe(id);
    }

    /// Tear the session down.
    pub fn shutdown(self) {
        // Drop does the work
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.runner.abort();
    }
}

/// Reconnect loop: establish, pump until the connection drops, back off.
async fn run_session(
    config: SessionConfig,
    mut outbound_rx: mpsc::UnboundedReceiver<ClientEvent>,
    state_tx: watch::Sender<ConnectionState>,
    channels: Arc<Channels>,
    shared: Arc<SessionShared>,
    ready_tx: oneshot::Sender<Result<(), ClientError>>,
) {
    let url = format!(
        "{}?user_id={}&token={}",
        config.ws_url, config.user_id, config.token
    );
    let mut ready = Some(ready_tx);
    let mut attempt: u32 = 0;

    loop {
        match establish(&url, &config.user_id).await {
            Ok(ws_stream) => {
                attempt = 0;
                let _ = state_tx.send(ConnectionState::Connected);
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(()));
                }
                tracing::info!("Connected as '{}'", config.user_id);

                pump(ws_stream, &mut outbound_rx, &channels, &shared).await;

                if outbound_rx.is_closed() {
                    // Session handle dropped; ended normally
                    return;
                }
                tracing::warn!("Connection lost");
            }
            Err(e) => {
                if reconnect::is_fatal(&e) {
                    let _ = state_tx.send(ConnectionState::GivenUp);
                    match ready.take() {
                        Some(tx) => {
                            let _ = tx.send(Err(e));
                        }
                        None => tracing::error!("{}", e),
                    }
                    return;
                }
                tracing::warn!("Connect attempt failed: {}", e);
            }
        }

        attempt += 1;
        if !config.policy.should_attempt(attempt) {
            let _ = state_tx.send(ConnectionState::GivenUp);
            match ready.take() {
                Some(tx) => {
                    let _ = tx.send(Err(ClientError::GaveUp(config.policy.max_attempts)));
                }
                None => tracing::error!(
                    "Failed to reconnect after {} attempts",
                    config.policy.max_attempts
                ),
            }
            return;
        }

        let delay = config.policy.delay_for(attempt);
        let _ = state_tx.send(ConnectionState::Reconnecting { attempt });
        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            attempt,
            config.policy.max_attempts
        );
        tokio::time::sleep(delay).await;
    }
}

/// One connect attempt, bounded by [`CONNECT_TIMEOUT`].
async fn establish(url: &str, user_id: &str) -> Result<WsStream, ClientError> {
    match timeout(CONNECT_TIMEOUT, connect_async(url)).await {
        Err(_) => Err(ClientError::ConnectTimeout(CONNECT_TIMEOUT)),
        Ok(Err(e)) => {
            // Check if it's an HTTP 401 rejection of the handshake credential
            let error_msg = e.to_string();
            if error_msg.contains("401") || error_msg.contains("Unauthorized") {
                Err(ClientError::AuthRejected(user_id.to_string()))
            } else {
                Err(ClientError::ConnectionError(error_msg))
            }
        }
        Ok(Ok((ws_stream, _response))) => Ok(ws_stream),
    }
}

/// Forward outbound events and republish inbound ones until the connection
/// drops.
async fn pump(
    ws_stream: WsStream,
    outbound_rx: &mut mpsc::UnboundedReceiver<ClientEvent>,
    channels: &Channels,
    shared: &SessionShared,
) {
    let (mut write, mut read) = ws_stream.split();

    // Re-issue chat-join for every room still held open, so room-scoped
    // delivery resumes after a reconnect.
    let open_rooms: Vec<String> = {
        let rooms = shared.open_rooms.lock().expect("open_rooms lock poisoned");
        rooms.iter().cloned().collect()
    };
    for conversation_id in open_rooms {
        tracing::info!("Rejoining conversation '{}'", conversation_id);
        let frame = ClientEvent::ChatJoin { conversation_id }.encode();
        if write.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = outbound_rx.recv() => match event {
                Some(event) => {
                    if write.send(Message::Text(event.encode().into())).await.is_err() {
                        return;
                    }
                }
                // Session handle dropped
                None => return,
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_server_event(&text, channels, shared),
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return;
                }
            },
        }
    }
}

/// Republish one server event through the subscription channels.
///
/// 購読者がいないチャネルへの send 失敗は無視する。
fn handle_server_event(text: &str, channels: &Channels, shared: &SessionShared) {
    let event = match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Failed to parse server event: {}", e);
            return;
        }
    };

    match event {
        ServerEvent::SessionReady { online_users } => {
            {
                let mut known = shared
                    .known_online
                    .lock()
                    .expect("known_online lock poisoned");
                *known = online_users.iter().cloned().collect();
            }
            let _ = channels.presence.send(PresenceEvent::Snapshot(online_users));
        }
        ServerEvent::MessageReceive { message } => {
            let fresh = shared
                .dedup
                .lock()
                .expect("dedup lock poisoned")
                .observe(message.id);
            if fresh {
                let _ = channels.messages.send(message);
            }
        }
        ServerEvent::ChatCreated { summary } | ServerEvent::ChatUpdated { summary } => {
            let _ = channels.summaries.send(summary);
        }
        ServerEvent::UserOnline { user_id } => {
            shared
                .known_online
                .lock()
                .expect("known_online lock poisoned")
                .insert(user_id.clone());
            let _ = channels.presence.send(PresenceEvent::Online(user_id));
        }
        ServerEvent::UserOffline { user_id } => {
            shared
                .known_online
                .lock()
                .expect("known_online lock poisoned")
                .remove(&user_id);
            let _ = channels.presence.send(PresenceEvent::Offline(user_id));
        }
        ServerEvent::UserTyping {
            conversation_id,
            user_id,
        } => {
            let _ = channels.typing.send(TypingEvent {
                conversation_id,
                user_id,
                typing: true,
            });
        }
        ServerEvent::UserStoppedTyping {
            conversation_id,
            user_id,
        } => {
            let _ = channels.typing.send(TypingEvent {
                conversation_id,
                user_id,
                typing: false,
            });
        }
    }
}
