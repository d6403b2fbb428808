//! Server state: the use cases behind the handlers plus the shared
//! registries.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionRegistry, ConversationStore, CredentialVerifier, RoomRoster};
use crate::infrastructure::pusher::WebSocketMessagePusher;
use crate::usecase::{
    ConnectSessionUseCase, CreateConversationUseCase, DeliverMessageUseCase,
    DisconnectSessionUseCase, JoinChatUseCase, LeaveChatUseCase, ListConversationsUseCase,
    MarkReadUseCase, MessageHistoryUseCase, TypingRelayUseCase,
};

/// Shared application state
pub struct AppState {
    pub connect_session: Arc<ConnectSessionUseCase>,
    pub disconnect_session: Arc<DisconnectSessionUseCase>,
    pub join_chat: Arc<JoinChatUseCase>,
    pub leave_chat: Arc<LeaveChatUseCase>,
    pub deliver_message: Arc<DeliverMessageUseCase>,
    pub typing_relay: Arc<TypingRelayUseCase>,
    pub mark_read: Arc<MarkReadUseCase>,
    pub create_conversation: Arc<CreateConversationUseCase>,
    pub list_conversations: Arc<ListConversationsUseCase>,
    pub message_history: Arc<MessageHistoryUseCase>,
    /// Shared registries, exposed for the debug endpoint.
    pub registry: Arc<Mutex<ConnectionRegistry>>,
    pub roster: Arc<Mutex<RoomRoster>>,
}

impl AppState {
    /// Wire up the full dependency graph around a conversation store and a
    /// credential verifier:
    ///
    /// 1. Shared registries (connections, room roster)
    /// 2. MessagePusher (WebSocket implementation)
    /// 3. UseCases
    pub fn build(
        store: Arc<dyn ConversationStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Arc<Self> {
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let roster = Arc::new(Mutex::new(RoomRoster::new()));
        let pusher = Arc::new(WebSocketMessagePusher::new());

        Arc::new(Self {
            connect_session: Arc::new(ConnectSessionUseCase::new(
                registry.clone(),
                pusher.clone(),
                verifier,
            )),
            disconnect_session: Arc::new(DisconnectSessionUseCase::new(
                registry.clone(),
                roster.clone(),
                pusher.clone(),
            )),
            join_chat: Arc::new(JoinChatUseCase::new(roster.clone(), store.clone())),
            leave_chat: Arc::new(LeaveChatUseCase::new(roster.clone())),
            deliver_message: Arc::new(DeliverMessageUseCase::new(
                registry.clone(),
                roster.clone(),
                store.clone(),
                pusher.clone(),
            )),
            typing_relay: Arc::new(TypingRelayUseCase::new(
                registry.clone(),
                roster.clone(),
                pusher.clone(),
            )),
            mark_read: Arc::new(MarkReadUseCase::new(
                registry.clone(),
                store.clone(),
                pusher.clone(),
            )),
            create_conversation: Arc::new(CreateConversationUseCase::new(
                registry.clone(),
                store.clone(),
                pusher.clone(),
            )),
            list_conversations: Arc::new(ListConversationsUseCase::new(store.clone())),
            message_history: Arc::new(MessageHistoryUseCase::new(store)),
            registry,
            roster,
        })
    }
}
