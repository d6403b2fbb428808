//! UseCase: セッション切断処理
//!
//! 接続の破棄に伴うクリーンアップを 1 箇所に集約します：ルーム台帳からの
//! 全メンバーシップの除去、送信チャンネルの破棄、レジストリからの削除、
//! そして最後の接続だった場合の user-offline ブロードキャスト。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionRegistry, MessagePusher, PresenceTransition, RoomRoster,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    roster: Arc<Mutex<RoomRoster>>,
    pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
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

    /// セッション切断を実行
    ///
    /// 明示的な chat-leave を経ない突然の切断でも呼ばれるため、全ての
    /// 操作は冪等。二重呼び出しは何もしない。
    pub async fn execute(&self, connection_id: ConnectionId) {
        // 1. ルーム台帳から全メンバーシップを除去（stale なファンアウト
        //    対象を残さない）
        let purged_rooms = {
            let mut roster = self.roster.lock().await;
            roster.purge_connection(&connection_id)
        };
        if !purged_rooms.is_empty() {
            tracing::debug!(
                "Purged connection '{}' from {} room(s)",
                connection_id,
                purged_rooms.len()
            );
        }

        // 2. 送信チャンネルを破棄
        self.pusher.unregister_connection(&connection_id).await;

        // 3. レジストリから削除し、presence 遷移を同一ロック内で取得
        let (transition, remaining) = {
            let mut registry = self.registry.lock().await;
            let transition = registry.unregister(&connection_id);
            (transition, registry.all_connections())
        };

        // 4. N → 0 の遷移のときだけ user-offline をブロードキャスト
        if let PresenceTransition::WentOffline(user) = transition {
            tracing::info!("User '{}' went offline", user);
            let event = ServerEvent::UserOffline {
                user_id: user.into_string(),
            };
            if let Err(e) = self.pusher.broadcast(remaining, &event.encode()).await {
                tracing::warn!("Failed to broadcast user-offline: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConversationId, UserId};
    use crate::usecase::test_support::RecordingPusher;

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    fn conv(name: &str) -> ConversationId {
        ConversationId::new(name.to_string()).unwrap()
    }

    struct Fixture {
        usecase: DisconnectSessionUseCase,
        registry: Arc<Mutex<ConnectionRegistry>>,
        roster: Arc<Mutex<RoomRoster>>,
        pusher: Arc<RecordingPusher>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let roster = Arc::new(Mutex::new(RoomRoster::new()));
        let pusher = Arc::new(RecordingPusher::new());
        let usecase =
            DisconnectSessionUseCase::new(registry.clone(), roster.clone(), pusher.clone());
        Fixture {
            usecase,
            registry,
            roster,
            pusher,
        }
    }

    #[tokio::test]
    async fn test_offline_broadcast_only_for_last_connection() {
        // テスト項目: 最後の接続の切断でのみ user-offline が送られる
        // given (前提条件):
        let f = fixture();
        let c1 = ConnectionId::generate();
        let c2 = ConnectionId::generate();
        {
            let mut registry = f.registry.lock().await;
            registry.register(c1, user("alice")).unwrap();
            registry.register(c2, user("alice")).unwrap();
        }

        // when (操作):
        f.usecase.execute(c1).await;
        let after_first = f.pusher.broadcasts_containing("user-offline").await.len();
        f.usecase.execute(c2).await;
        let after_second = f.pusher.broadcasts_containing("user-offline").await.len();

        // then (期待する結果):
        assert_eq!(after_first, 0);
        assert_eq!(after_second, 1);
    }

    #[tokio::test]
    async fn test_disconnect_purges_room_memberships() {
        // テスト項目: 突然の切断でも全ルームからメンバーシップが消える
        // given (前提条件):
        let f = fixture();
        let c1 = ConnectionId::generate();
        {
            let mut registry = f.registry.lock().await;
            registry.register(c1, user("bob")).unwrap();
        }
        {
            let mut roster = f.roster.lock().await;
            roster.join(c1, conv("conv-x"));
            roster.join(c1, conv("conv-y"));
        }

        // when (操作):
        f.usecase.execute(c1).await;

        // then (期待する結果):
        let roster = f.roster.lock().await;
        assert!(roster.members_of(&conv("conv-x")).is_empty());
        assert!(roster.members_of(&conv("conv-y")).is_empty());
    }

    #[tokio::test]
    async fn test_double_disconnect_is_silent() {
        // テスト項目: 二重切断では 2 回目の user-offline が出ない
        // given (前提条件):
        let f = fixture();
        let c1 = ConnectionId::generate();
        {
            let mut registry = f.registry.lock().await;
            registry.register(c1, user("alice")).unwrap();
        }

        // when (操作):
        f.usecase.execute(c1).await;
        f.usecase.execute(c1).await;

        // then (期待する結果):
        let offline_events = f.pusher.broadcasts_containing("user-offline").await;
        assert_eq!(offline_events.len(), 1);
    }
}
