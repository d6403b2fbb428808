//! UseCase: 会話の既読化
//!
//! 読んだ側のロールの未読カウンタを 0 に戻し、更新後のサマリを両参加者の
//! 全接続へ通知します。別タブで開いている一覧ビューのバッジもこれで揃い
//! ます。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionRegistry, Conversation, ConversationId, ConversationStore, MessagePusher,
    StoreError, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

use super::error::MarkReadError;

/// 既読化のユースケース
pub struct MarkReadUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    store: Arc<dyn ConversationStore>,
    pusher: Arc<dyn MessagePusher>,
}

impl MarkReadUseCase {
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

    /// 既読化を実行し、更新後の会話を返す
    pub async fn execute(
        &self,
        user: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, MarkReadError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => MarkReadError::ConversationNotFound(id),
                other => {
                    tracing::error!("Unexpected store error during mark-read: {}", other);
                    MarkReadError::ConversationNotFound(conversation_id.to_string())
                }
            })?;

        let role = conversation.role_of(user).ok_or_else(|| {
            MarkReadError::NotAParticipant(user.to_string(), conversation_id.to_string())
        })?;

        let updated = self
            .store
            .mark_read(conversation_id, role)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => MarkReadError::ConversationNotFound(id),
                other => {
                    tracing::error!("Unexpected store error during mark-read: {}", other);
                    MarkReadError::ConversationNotFound(conversation_id.to_string())
                }
            })?;

        let targets = {
            let registry = self.registry.lock().await;
            let mut targets = registry.connections_for(&updated.company);
            targets.extend(registry.connections_for(&updated.freelancer));
            targets
        };
        let event = ServerEvent::ChatUpdated {
            summary: updated.clone().into(),
        };
        if let Err(e) = self.pusher.broadcast(targets, &event.encode()).await {
            tracing::warn!("Failed to broadcast chat-updated after mark-read: {}", e);
        }

        Ok(updated)
    }
}
