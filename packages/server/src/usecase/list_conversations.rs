//! UseCase: 会話一覧の取得

use std::sync::Arc;

use crate::domain::{Conversation, ConversationStore, UserId};

/// 会話一覧取得のユースケース
pub struct ListConversationsUseCase {
    store: Arc<dyn ConversationStore>,
}

impl ListConversationsUseCase {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// ユーザーが参加している会話を更新日時の降順で返す
    pub async fn execute(&self, user: &UserId) -> Vec<Conversation> {
        self.store.conversations_for(user).await
    }
}
