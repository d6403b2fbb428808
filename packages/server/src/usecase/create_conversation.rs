//! UseCase: 会話の新規作成
//!
//! 会話レコード自体は外部データ層の持ち物ですが、新しい会話が生まれた
//! ことを両参加者の全接続へ chat-created として通知するのはチャットコアの
//! 責務です。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionRegistry, Conversation, ConversationStore, MessagePusher, StoreError, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

use super::error::CreateConversationError;

/// 会話作成のユースケース
pub struct CreateConversationUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    store: Arc<dyn ConversationStore>,
    pusher: Arc<dyn MessagePusher>,
}

impl CreateConversationUseCase {
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        store: Arc<dyn ConversationStore>,
        pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            store,
            pusher,
        }
    }

    pub async fn execute(
        &self,
        company: UserId,
        freelancer: UserId,
    ) -> Result<Conversation, CreateConversationError> {
        let conversation = self
            .store
            .create_conversation(company, freelancer)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateConversation(company, freelancer) => {
                    CreateConversationError::AlreadyExists(company, freelancer)
                }
                other => CreateConversationError::StoreFailed(other),
            })?;

        let targets = {
            let registry = self.registry.lock().await;
            let mut targets = registry.connections_for(&conversation.company);
            targets.extend(registry.connections_for(&conversation.freelancer));
            targets
        };
        let event = ServerEvent::ChatCreated {
            summary: conversation.clone().into(),
        };
        if let Err(e) = self.pusher.broadcast(targets, &event.encode()).await {
            tracing::warn!("Failed to broadcast chat-created: {}", e);
        }

        Ok(conversation)
    }
}
