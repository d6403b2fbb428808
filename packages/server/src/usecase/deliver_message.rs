//! UseCase: メッセージ配信パイプライン
//!
//! 配信順序は「永続化 → 採番されたレコードの取得 → ブロードキャスト」に
//! 固定します。永続化に失敗したメッセージは決して配信されません。オフライン
//! の参加者は後から履歴 API で正規のレコードを取得するため、永続化前の
//! 楽観的ブロードキャストは行いません。
//!
//! ファンアウトは現在のルームメンバー全員（送信者の他タブを含む）に対して
//! 行い、クライアント側のメッセージ ID による重複排除に任せます。これに
//! よりマルチタブの同期が追加の仕組みなしに成立します。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRegistry, ConversationId, ConversationStore,
    DeliveryState, MessageContent, MessagePusher, RoomRoster, StoreError, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

use super::error::SendMessageError;

/// メッセージ配信のユースケース
pub struct DeliverMessageUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    roster: Arc<Mutex<RoomRoster>>,
    store: Arc<dyn ConversationStore>,
    pusher: Arc<dyn MessagePusher>,
}

impl DeliverMessageUseCase {
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        roster: Arc<Mutex<RoomRoster>>,
        store: Arc<dyn ConversationStore>,
        pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            roster,
            store,
            pusher,
        }
    }

    /// メッセージ配信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者のユーザー ID
    /// * `conversation_id` - 対象の会話
    /// * `content` - 検証済みのメッセージ本文
    /// * `attachment` - 添付ファイルへの参照（外部ストレージの URL 等）
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 永続化された正規のメッセージレコード
    /// * `Err(SendMessageError)` - 認可エラーまたは永続化失敗
    pub async fn execute(
        &self,
        sender: UserId,
        conversation_id: ConversationId,
        content: MessageContent,
        attachment: Option<String>,
    ) -> Result<ChatMessage, SendMessageError> {
        // 1. 認可: 送信者が会話の参加者であることを確認
        let conversation = self
            .store
            .get_conversation(&conversation_id)
            .await
            .map_err(|e| match e {
                StoreError::ConversationNotFound(id) => {
                    SendMessageError::ConversationNotFound(id)
                }
                other => SendMessageError::PersistFailed(other),
            })?;
        if conversation.role_of(&sender).is_none() {
            return Err(SendMessageError::NotAParticipant(
                sender.into_string(),
                conversation_id.into_string(),
            ));
        }

        // 2. 永続化（ID・タイムスタンプ・未読カウンタの更新はストア側）
        let mut message = self
            .store
            .append_message(&conversation_id, sender, content, attachment)
            .await
            .map_err(SendMessageError::PersistFailed)?;

        // 3. 現在のルームメンバーへファンアウト
        let members = {
            let roster = self.roster.lock().await;
            roster.members_of(&conversation_id)
        };
        let delivered = !members.is_empty();
        let receive_event = ServerEvent::MessageReceive {
            message: message.clone().into(),
        };
        if let Err(e) = self.pusher.broadcast(members, &receive_event.encode()).await {
            // ファンアウトの失敗は接続単位でベストエフォート。送信自体は
            // 永続化済みなので成功として扱う。
            tracing::warn!("Fan-out failed for message '{}': {}", message.id, e);
        }

        // 4. 1 つでもルームメンバーに届いたら Delivered に進める
        if delivered {
            if let Err(e) = self.store.mark_delivered(&conversation_id, message.id).await {
                tracing::warn!("Failed to mark message '{}' delivered: {}", message.id, e);
            } else {
                message.state = DeliveryState::Delivered;
            }
        }

        // 5. 会話サマリの更新を両参加者の全接続へ通知（ルームメンバーか
        //    どうかは問わない。一覧ビューはルームに join せずにバッジを
        //    更新する）
        match self.store.get_conversation(&conversation_id).await {
            Ok(updated) => {
                let targets = self.connections_of_participants(&updated.company, &updated.freelancer).await;
                let updated_event = ServerEvent::ChatUpdated {
                    summary: updated.into(),
                };
                if let Err(e) = self.pusher.broadcast(targets, &updated_event.encode()).await {
                    tracing::warn!("Failed to broadcast chat-updated: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to reload conversation for summary: {}", e);
            }
        }

        Ok(message)
    }

    /// 両参加者が持つ全接続（タブ・デバイスを含む）
    async fn connections_of_participants(
        &self,
        company: &UserId,
        freelancer: &UserId,
    ) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        let mut targets = registry.connections_for(company);
        targets.extend(registry.connections_for(freelancer));
        targets
    }
}
