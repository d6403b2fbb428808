//! UseCase: タイピング通知の中継
//!
//! 純粋な転送器です。サーバーはタイマーも状態も持たず、停止通知は
//! 入力が止まってから一定時間後にクライアント自身が送ります。永続化も
//! 行わないため、切断時のクリーンアップは不要です。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionRegistry, ConversationId, MessagePusher, RoomRoster,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// タイピング通知中継のユースケース
pub struct TypingRelayUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    roster: Arc<Mutex<RoomRoster>>,
    pusher: Arc<dyn MessagePusher>,
}

impl TypingRelayUseCase {
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        roster: Arc<Mutex<RoomRoster>>,
        pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            roster,
            pusher,
        }
    }

    /// タイピング通知を中継
    ///
    /// 発信元の接続を除くルームメンバーへ転送する。発信元の接続が
    /// レジストリに無い場合（切断直後のレース）は黙って捨てる。
    pub async fn execute(
        &self,
        origin: ConnectionId,
        conversation_id: ConversationId,
        typing: bool,
    ) {
        let Some(user) = ({
            let registry = self.registry.lock().await;
            registry.user_of(&origin).cloned()
        }) else {
            tracing::debug!("Typing signal from unknown connection '{}', dropped", origin);
            return;
        };

        let targets: Vec<ConnectionId> = {
            let roster = self.roster.lock().await;
            roster
                .members_of(&conversation_id)
                .into_iter()
                .filter(|member| member != &origin)
                .collect()
        };

        let event = if typing {
            ServerEvent::UserTyping {
                conversation_id: conversation_id.into_string(),
                user_id: user.into_string(),
            }
        } else {
            ServerEvent::UserStoppedTyping {
                conversation_id: conversation_id.into_string(),
                user_id: user.into_string(),
            }
        };

        if let Err(e) = self.pusher.broadcast(targets, &event.encode()).await {
            tracing::warn!("Failed to relay typing signal: {}", e);
        }
    }
}
