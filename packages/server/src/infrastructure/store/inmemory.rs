//! インメモリの ConversationStore 実装
//!
//! ## 責務
//!
//! - 会話・メッセージ履歴・未読カウンタの保持
//! - メッセージ ID とサーバータイムスタンプの採番
//!
//! 本番環境では外部のドキュメントストアがこの役割を担います。この実装は
//! 開発・テスト用の代役であり、trait の契約（永続化成功後にのみ正規の
//! レコードを返す、未読カウンタの更新と同一ステップで行う）を満たします。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use renraku_shared::time::Clock;

use crate::domain::{
    ChatMessage, Conversation, ConversationId, ConversationStore, DeliveryState, MessageContent,
    MessageId, ParticipantRole, StoreError, Timestamp, UserId,
};

/// Maximum number of messages held per conversation.
const MAX_HISTORY: usize = 1000;

#[derive(Default)]
struct StoreInner {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<ChatMessage>>,
}

/// In-memory conversation store.
pub struct InMemoryConversationStore {
    inner: Mutex<StoreInner>,
    clock: Arc<dyn Clock>,
}

impl InMemoryConversationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            clock,
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        company: UserId,
        freelancer: UserId,
    ) -> Result<Conversation, StoreError> {
        let mut inner = self.inner.lock().await;

        if inner
            .conversations
            .values()
            .any(|c| c.company == company && c.freelancer == freelancer)
        {
            return Err(StoreError::DuplicateConversation(
                company.into_string(),
                freelancer.into_string(),
            ));
        }

        let id = ConversationId::new(Uuid::new_v4().to_string())
            .expect("UUID string is never empty");
        let created_at = Timestamp::new(self.clock.now_millis());
        let conversation = Conversation::new(id.clone(), company, freelancer, created_at);
        inner.conversations.insert(id, conversation.clone());

        Ok(conversation)
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .conversations
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))
    }

    async fn conversations_for(&self, user: &UserId) -> Vec<Conversation> {
        let inner = self.inner.lock().await;
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.role_of(user).is_some())
            .cloned()
            .collect();
        // 一覧表示は更新日時の降順
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        sender: UserId,
        content: MessageContent,
        attachment: Option<String>,
    ) -> Result<ChatMessage, StoreError> {
        let mut inner = self.inner.lock().await;

        let conversation = inner
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

        let sender_role = conversation.role_of(&sender).ok_or_else(|| {
            StoreError::NotAParticipant(sender.to_string(), conversation_id.to_string())
        })?;

        let history_len = inner
            .messages
            .get(conversation_id)
            .map(Vec::len)
            .unwrap_or(0);
        if history_len >= MAX_HISTORY {
            return Err(StoreError::HistoryCapacityExceeded(
                conversation_id.to_string(),
            ));
        }

        let sent_at = Timestamp::new(self.clock.now_millis());
        let message = ChatMessage {
            id: MessageId::generate(),
            conversation_id: conversation_id.clone(),
            sender,
            content,
            attachment,
            sent_at,
            state: DeliveryState::Sent,
        };

        // 永続化と未読カウンタ・プレビューの更新は同一ロック内で行う
        let conversation = inner
            .conversations
            .get_mut(conversation_id)
            .expect("conversation existence checked above");
        conversation.record_message(sender_role, &message.content, sent_at);
        inner
            .messages
            .entry(conversation_id.clone())
            .or_default()
            .push(message.clone());

        Ok(message)
    }

    async fn mark_delivered(
        &self,
        conversation_id: &ConversationId,
        message_id: MessageId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let messages = inner
            .messages
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
            if message.state == DeliveryState::Sent {
                message.state = DeliveryState::Delivered;
            }
        }
        Ok(())
    }

    async fn message_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.lock().await;
        if !inner.conversations.contains_key(conversation_id) {
            return Err(StoreError::ConversationNotFound(conversation_id.to_string()));
        }
        Ok(inner
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        role: ParticipantRole,
    ) -> Result<Conversation, StoreError> {
        let mut inner = self.inner.lock().await;

        let conversation = inner
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        conversation.mark_read(role);
        let updated = conversation.clone();
        let reader = updated.participant(role).clone();

        // 相手が送ったメッセージを既読に進める（読んだ側のロールに紐づく
        // read receipt）
        if let Some(messages) = inner.messages.get_mut(conversation_id) {
            for message in messages.iter_mut().filter(|m| m.sender != reader) {
                message.state = DeliveryState::Read;
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renraku_shared::time::FixedClock;

    fn store() -> InMemoryConversationStore {
        InMemoryConversationStore::new(Arc::new(FixedClock::new(1000)))
    }

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        // テスト項目: 作成した会話が ID で取得できる
        // given (前提条件):
        let store = store();

        // when (操作):
        let created = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        let fetched = store.get_conversation(&created.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(created, fetched);
        assert_eq!(fetched.created_at, Timestamp::new(1000));
    }

    #[tokio::test]
    async fn test_duplicate_conversation_is_rejected() {
        // テスト項目: 同じ参加者ペアの会話は二重に作成できない
        // given (前提条件):
        let store = store();
        store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();

        // when (操作):
        let result = store.create_conversation(user("acme"), user("yuki")).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(StoreError::DuplicateConversation(_, _))
        ));
    }

    #[tokio::test]
    async fn test_append_message_assigns_id_and_timestamp() {
        // テスト項目: メッセージ永続化時にサーバー側で ID とタイムスタンプが
        //             採番される
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();

        // when (操作):
        let message = store
            .append_message(&conversation.id, user("acme"), content("Hello"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.sent_at, Timestamp::new(1000));
        assert_eq!(message.state, DeliveryState::Sent);
        let history = store.message_history(&conversation.id).await.unwrap();
        assert_eq!(history, vec![message]);
    }

    #[tokio::test]
    async fn test_append_message_updates_unread_counter() {
        // テスト項目: メッセージ永続化と同時に相手側の未読カウンタが増加する
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();

        // when (操作):
        store
            .append_message(&conversation.id, user("acme"), content("Hello"), None)
            .await
            .unwrap();
        let updated = store.get_conversation(&conversation.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(updated.unread(ParticipantRole::Freelancer), 1);
        assert_eq!(updated.unread(ParticipantRole::Company), 0);
        assert_eq!(updated.last_preview(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_append_message_from_non_participant_is_rejected() {
        // テスト項目: 参加者でないユーザーのメッセージは永続化されない
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();

        // when (操作):
        let result = store
            .append_message(&conversation.id, user("mallory"), content("hi"), None)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::NotAParticipant(_, _))));
        let history = store.message_history(&conversation.id).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_resets_counter_and_messages() {
        // テスト項目: 既読化で未読カウンタが 0 になり、相手のメッセージが
        //             Read に遷移する
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        store
            .append_message(&conversation.id, user("acme"), content("Hello"), None)
            .await
            .unwrap();

        // when (操作):
        let updated = store
            .mark_read(&conversation.id, ParticipantRole::Freelancer)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(updated.unread(ParticipantRole::Freelancer), 0);
        let history = store.message_history(&conversation.id).await.unwrap();
        assert_eq!(history[0].state, DeliveryState::Read);
    }

    #[tokio::test]
    async fn test_mark_delivered_advances_state_once() {
        // テスト項目: mark_delivered が Sent → Delivered にのみ進める
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        let message = store
            .append_message(&conversation.id, user("acme"), content("Hello"), None)
            .await
            .unwrap();

        // when (操作):
        store
            .mark_delivered(&conversation.id, message.id)
            .await
            .unwrap();

        // then (期待する結果):
        let history = store.message_history(&conversation.id).await.unwrap();
        assert_eq!(history[0].state, DeliveryState::Delivered);
    }

    #[tokio::test]
    async fn test_conversations_for_filters_by_participant() {
        // テスト項目: conversations_for が参加している会話のみを返す
        // given (前提条件):
        let store = store();
        store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        store
            .create_conversation(user("globex"), user("ren"))
            .await
            .unwrap();

        // when (操作):
        let for_yuki = store.conversations_for(&user("yuki")).await;
        let for_mallory = store.conversations_for(&user("mallory")).await;

        // then (期待する結果):
        assert_eq!(for_yuki.len(), 1);
        assert_eq!(for_yuki[0].freelancer, user("yuki"));
        assert!(for_mallory.is_empty());
    }

    #[tokio::test]
    async fn test_history_capacity_is_enforced() {
        // テスト項目: 履歴の上限を超えるメッセージは拒否される
        // given (前提条件):
        let store = store();
        let conversation = store
            .create_conversation(user("acme"), user("yuki"))
            .await
            .unwrap();
        for _ in 0..MAX_HISTORY {
            store
                .append_message(&conversation.id, user("acme"), content("m"), None)
                .await
                .unwrap();
        }

        // when (操作):
        let result = store
            .append_message(&conversation.id, user("acme"), content("one too many"), None)
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(StoreError::HistoryCapacityExceeded(_))
        ));
    }
}
