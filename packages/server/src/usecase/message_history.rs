//! UseCase: メッセージ履歴の取得
//!
//! 履歴は会話の参加者だけが読める。認可はこの境界で行う。

use std::sync::Arc;

use crate::domain::{ChatMessage, ConversationId, ConversationStore, StoreError, UserId};

use super::error::HistoryError;

/// メッセージ履歴取得のユースケース
pub struct MessageHistoryUseCase {
    store: Arc<dyn ConversationStore>,
}

impl MessageHistoryUseCase {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// 永続化順のメッセージ履歴を返す
    pub async fn execute(
        &self,
        user: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => HistoryError::ConversationNotFound(id),
                other => {
                    tracing::error!("Unexpected store error during history fetch: {}", other);
                    HistoryError::ConversationNotFound(conversation_id.to_string())
                }
            })?;

        if conversation.role_of(user).is_none() {
            return Err(HistoryError::NotAParticipant(
                user.to_string(),
                conversation_id.to_string(),
            ));
        }

        self.store
            .message_history(conversation_id)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => HistoryError::ConversationNotFound(id),
                other => {
                    tracing::error!("Unexpected store error during history fetch: {}", other);
                    HistoryError::ConversationNotFound(conversation_id.to_string())
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;
    use crate::infrastructure::store::InMemoryConversationStore;
    use renraku_shared::time::FixedClock;

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_participant_reads_history_in_persisted_order() {
        // テスト項目: 参加者は永続化順の履歴を取得できる
        // given (前提条件):
        let store = Arc::new(InMemoryConversationStore::new(Arc::new(FixedClock::new(0))));
        let usecase = MessageHistoryUseCase::new(store.clone());
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        for text in ["first", "second", "third"] {
            store
                .append_message(
                    &conversation.id,
                    user("acme"),
                    MessageContent::new(text.to_string()).unwrap(),
                    None,
                )
                .await
                .unwrap();
        }

        // when (操作):
        let history = usecase.execute(&user("yuki"), &conversation.id).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_history() {
        // テスト項目: 参加者でないユーザーは履歴を読めない
        // given (前提条件):
        let store = Arc::new(InMemoryConversationStore::new(Arc::new(FixedClock::new(0))));
        let usecase = MessageHistoryUseCase::new(store.clone());
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();

        // when (操作):
        let result = usecase.execute(&user("mallory"), &conversation.id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(HistoryError::NotAParticipant(_, _))));
    }
}
