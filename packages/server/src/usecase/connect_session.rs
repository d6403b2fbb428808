//! UseCase: セッション接続処理
//!
//! 資格情報の検証、接続レジストリへの登録、presence 遷移のブロードキャスト
//! までを 1 つの論理ステップとして実行します。presence の再計算はレジストリ
//! 変更の戻り値として同期的に得られるため、ポーリングは存在しません。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionRegistry, CredentialVerifier, MessagePusher, PresenceTransition,
    PusherChannel, RegistryError, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

use super::error::ConnectError;

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    registry: Arc<Mutex<ConnectionRegistry>>,
    pusher: Arc<dyn MessagePusher>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl ConnectSessionUseCase {
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        pusher: Arc<dyn MessagePusher>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            registry,
            pusher,
            verifier,
        }
    }

    /// セッション接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - サーバーが採番した接続 ID
    /// * `user` - ハンドシェイクで申告されたユーザー ID
    /// * `token` - ハンドシェイクに付随する資格情報
    /// * `sender` - この接続への送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<UserId>)` - 接続成功。現在オンラインのユーザーの
    ///   スナップショット（session-ready 用）を返す
    /// * `Err(ConnectError)` - 資格情報不正または接続 ID 衝突
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user: UserId,
        token: &str,
        sender: PusherChannel,
    ) -> Result<Vec<UserId>, ConnectError> {
        // 1. 資格情報の検証（ハンドシェイク時に一度だけ）
        if !self.verifier.verify(&user, token).await {
            return Err(ConnectError::InvalidCredential(user.into_string()));
        }

        // 2. レジストリへの登録・送信チャンネルの登録・presence 遷移の取得を
        //    同一ロック内で行う。並行する接続がこの接続をレジストリで観測
        //    できるのはロック解放後なので、その時点では送信チャンネルが必ず
        //    登録済みであり、user-online が宛先不明で落ちることはない。
        let (transition, online_snapshot, other_connections) = {
            let mut registry = self.registry.lock().await;
            let transition = registry.register(connection_id, user.clone()).map_err(
                |RegistryError::DuplicateConnection(id)| ConnectError::DuplicateConnection(id),
            )?;
            self.pusher.register_connection(connection_id, sender).await;
            let snapshot = registry.online_users();
            let others: Vec<ConnectionId> = registry
                .all_connections()
                .into_iter()
                .filter(|id| id != &connection_id)
                .collect();
            (transition, snapshot, others)
        };

        // 3. 0 → 1 の遷移のときだけ user-online をブロードキャスト
        if let PresenceTransition::CameOnline(user) = transition {
            let event = ServerEvent::UserOnline {
                user_id: user.into_string(),
            };
            if let Err(e) = self.pusher.broadcast(other_connections, &event.encode()).await {
                tracing::warn!("Failed to broadcast user-online: {}", e);
            }
        }

        Ok(online_snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::OpaqueTokenVerifier;
    use crate::usecase::test_support::RecordingPusher;
    use tokio::sync::mpsc;

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    fn usecase() -> (ConnectSessionUseCase, Arc<RecordingPusher>) {
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let pusher = Arc::new(RecordingPusher::new());
        let usecase = ConnectSessionUseCase::new(
            registry,
            pusher.clone(),
            Arc::new(OpaqueTokenVerifier),
        );
        (usecase, pusher)
    }

    #[tokio::test]
    async fn test_first_connection_broadcasts_online_once() {
        // テスト項目: 同一ユーザーの 2 本目の接続では user-online が
        //             ブロードキャストされない
        // given (前提条件):
        let (usecase, pusher) = usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        usecase
            .execute(ConnectionId::generate(), user("alice"), "token", tx1)
            .await
            .unwrap();
        usecase
            .execute(ConnectionId::generate(), user("alice"), "token", tx2)
            .await
            .unwrap();

        // then (期待する結果):
        let online_events = pusher.broadcasts_containing("user-online").await;
        assert_eq!(online_events.len(), 1);
    }

    #[tokio::test]
    async fn test_online_broadcast_excludes_new_connection() {
        // テスト項目: user-online は新しい接続自身には送られない
        // given (前提条件):
        let (usecase, pusher) = usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let c1 = ConnectionId::generate();

        // when (操作):
        usecase.execute(c1, user("alice"), "token", tx1).await.unwrap();

        // then (期待する結果): 他に接続がいないのでブロードキャスト対象は空
        let broadcasts = pusher.broadcasts().await;
        assert_eq!(broadcasts.len(), 1);
        assert!(broadcasts[0].0.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_contains_online_users() {
        // テスト項目: 接続成功時に現在オンラインのユーザー一覧が返る
        // given (前提条件):
        let (usecase, _pusher) = usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        usecase
            .execute(ConnectionId::generate(), user("alice"), "token", tx1)
            .await
            .unwrap();

        // when (操作):
        let snapshot = usecase
            .execute(ConnectionId::generate(), user("bob"), "token", tx2)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(snapshot, vec![user("alice"), user("bob")]);
    }

    #[tokio::test]
    async fn test_invalid_credential_is_rejected() {
        // テスト項目: 空の資格情報では接続できない
        // given (前提条件):
        let (usecase, pusher) = usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = usecase
            .execute(ConnectionId::generate(), user("alice"), "", tx)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::InvalidCredential(_))));
        assert!(pusher.broadcasts().await.is_empty());
    }

    /// ブロードキャスト時点で送信チャンネル未登録だった宛先を記録する
    /// MessagePusher
    #[derive(Default)]
    struct ChannelTrackingPusher {
        registered: Mutex<std::collections::HashSet<ConnectionId>>,
        unreachable: Mutex<Vec<ConnectionId>>,
    }

    #[async_trait::async_trait]
    impl crate::domain::MessagePusher for ChannelTrackingPusher {
        async fn register_connection(&self, connection_id: ConnectionId, _sender: PusherChannel) {
            self.registered.lock().await.insert(connection_id);
        }

        async fn unregister_connection(&self, connection_id: &ConnectionId) {
            self.registered.lock().await.remove(connection_id);
        }

        async fn push_to(
            &self,
            _connection_id: &ConnectionId,
            _content: &str,
        ) -> Result<(), crate::domain::PushError> {
            Ok(())
        }

        async fn broadcast(
            &self,
            targets: Vec<ConnectionId>,
            _content: &str,
        ) -> Result<(), crate::domain::PushError> {
            let registered = self.registered.lock().await;
            let mut unreachable = self.unreachable.lock().await;
            for target in targets {
                if !registered.contains(&target) {
                    unreachable.push(target);
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_online_broadcast_never_targets_unregistered_channel() {
        // テスト項目: 並行して接続が張られても、user-online のブロード
        //             キャスト先には常に送信チャンネルが登録済みである
        // given (前提条件):
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let pusher = Arc::new(ChannelTrackingPusher::default());
        let usecase = Arc::new(ConnectSessionUseCase::new(
            registry,
            pusher.clone(),
            Arc::new(OpaqueTokenVerifier),
        ));

        // when (操作): 別ユーザーの接続を同時に張る
        let connects: Vec<_> = ["alice", "bob", "carol", "dave"]
            .iter()
            .map(|name| {
                let usecase = usecase.clone();
                let user = user(name);
                tokio::spawn(async move {
                    let (tx, _rx) = mpsc::unbounded_channel();
                    usecase
                        .execute(ConnectionId::generate(), user, "token", tx)
                        .await
                })
            })
            .collect();
        for handle in connects {
            handle.await.unwrap().unwrap();
        }

        // then (期待する結果): チャンネル未登録の宛先へのブロードキャストは
        //                      一度も起きない
        assert!(pusher.unreachable.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_connection_id_is_fatal() {
        // テスト項目: 接続 ID の衝突はエラーになる
        // given (前提条件):
        let (usecase, _pusher) = usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let c1 = ConnectionId::generate();
        usecase.execute(c1, user("alice"), "token", tx1).await.unwrap();

        // when (操作):
        let result = usecase.execute(c1, user("bob"), "token", tx2).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::DuplicateConnection(_))));
    }
}
