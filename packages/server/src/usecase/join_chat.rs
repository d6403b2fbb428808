//! UseCase: ルーム参加処理
//!
//! 参加要求の認可はこの境界で行います。ルーム台帳自体は認可を知らず、
//! ここを通過した接続だけが join されます。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConversationId, ConversationStore, RoomRoster, StoreError, UserId,
};

use super::error::ChatJoinError;

/// ルーム参加のユースケース
pub struct JoinChatUseCase {
    roster: Arc<Mutex<RoomRoster>>,
    store: Arc<dyn ConversationStore>,
}

impl JoinChatUseCase {
    pub fn new(roster: Arc<Mutex<RoomRoster>>, store: Arc<dyn ConversationStore>) -> Self {
        Self { roster, store }
    }

    /// ルーム参加を実行
    ///
    /// 要求ユーザーが会話の参加者であることを確認してから台帳に登録する。
    /// 二重 join は冪等（エラーにしない）。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user: &UserId,
        conversation_id: ConversationId,
    ) -> Result<(), ChatJoinError> {
        let conversation = self
            .store
            .get_conversation(&conversation_id)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => ChatJoinError::ConversationNotFound(id),
                other => {
                    tracing::error!("Unexpected store error during join: {}", other);
                    ChatJoinError::ConversationNotFound(conversation_id.to_string())
                }
            })?;

        if conversation.role_of(user).is_none() {
            return Err(ChatJoinError::NotAParticipant(
                user.to_string(),
                conversation_id.to_string(),
            ));
        }

        let mut roster = self.roster.lock().await;
        roster.join(connection_id, conversation_id);
        Ok(())
    }
}
