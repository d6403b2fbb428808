//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConversationId, UserId},
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::AppState,
    usecase::ConnectError,
};

use serde::Deserialize;

/// Query parameters for WebSocket connection
///
/// 資格情報はハンドシェイククエリで一度だけ運ばれる。接続確立後の
/// イベントに認証情報は含まれない。
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    pub token: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id_str = query.user_id;

    // Convert String -> UserId (Domain Model)
    let user = match UserId::new(user_id_str.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", user_id_str);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Connection IDs are assigned here, one per socket. The same user may
    // hold several connections (tabs) at once.
    let connection_id = ConnectionId::generate();

    // Create a channel for this connection to receive pushed events
    let (tx, rx) = mpsc::unbounded_channel();

    let user_for_handle = user.clone();
    match state
        .connect_session
        .execute(connection_id, user, &query.token, tx)
        .await
    {
        Ok(online_users) => {
            tracing::info!(
                "User '{}' connected (connection {})",
                user_id_str,
                connection_id
            );
            Ok(ws.on_upgrade(move |socket| {
                handle_socket(socket, state, connection_id, user_for_handle, rx, online_users)
            }))
        }
        Err(ConnectError::InvalidCredential(_)) => {
            tracing::warn!("Rejected credential for user '{}'", user_id_str);
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(ConnectError::DuplicateConnection(_)) => {
            tracing::error!("Connection id collision for user '{}'", user_id_str);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Spawns a task that receives events from the rx channel and pushes them to
/// the WebSocket sender.
///
/// UseCase 層がファンアウトしたイベントはこのチャネル経由でソケットに
/// 流れる。ソケットが閉じたらループを抜ける。
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    user: UserId,
    rx: mpsc::UnboundedReceiver<String>,
    online_users: Vec<UserId>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Send the presence snapshot to the newly connected client, before any
    // pushed event. Afterwards the client maintains its set purely from
    // user-online / user-offline events.
    {
        let ready = ServerEvent::SessionReady {
            online_users: online_users.into_iter().map(|u| u.into_string()).collect(),
        };
        if let Err(e) = sender.send(Message::Text(ready.encode().into())).await {
            tracing::error!("Failed to send session-ready to '{}': {}", user, e);
            state.disconnect_session.execute(connection_id).await;
            return;
        }
        tracing::info!("Sent session-ready to '{}'", user);
    }

    let user_clone = user.clone();
    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Parse the incoming event
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            continue;
                        }
                    };

                    dispatch_client_event(&state_clone, connection_id, &user_clone, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", user_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive pushed events and send them to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Room memberships, the pusher channel and the registry entry are all
    // cleaned up here, whatever ended the connection.
    state.disconnect_session.execute(connection_id).await;
    tracing::info!(
        "User '{}' disconnected (connection {})",
        user,
        connection_id
    );
}

/// Dispatch one parsed client event to the matching use case.
///
/// 不正な会話 ID や参加者でない要求は警告ログに落として接続は維持する。
async fn dispatch_client_event(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    user: &UserId,
    event: ClientEvent,
) {
    match event {
        ClientEvent::ChatJoin { conversation_id } => {
            let Ok(conversation_id) = ConversationId::new(conversation_id) else {
                tracing::warn!("chat-join with empty conversation_id from '{}'", user);
                return;
            };
            if let Err(e) = state
                .join_chat
                .execute(connection_id, user, conversation_id)
                .await
            {
                tracing::warn!("Rejected chat-join from '{}': {}", user, e);
            }
        }
        ClientEvent::ChatLeave { conversation_id } => {
            let Ok(conversation_id) = ConversationId::new(conversation_id) else {
                tracing::warn!("chat-leave with empty conversation_id from '{}'", user);
                return;
            };
            state
                .leave_chat
                .execute(&connection_id, &conversation_id)
                .await;
        }
        ClientEvent::TypingStart { conversation_id } => {
            let Ok(conversation_id) = ConversationId::new(conversation_id) else {
                return;
            };
            state
                .typing_relay
                .execute(connection_id, conversation_id, true)
                .await;
        }
        ClientEvent::TypingStop { conversation_id } => {
            let Ok(conversation_id) = ConversationId::new(conversation_id) else {
                return;
            };
            state
                .typing_relay
                .execute(connection_id, conversation_id, false)
                .await;
        }
    }
}
