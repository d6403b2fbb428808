//! UseCase テスト用の記録型 MessagePusher

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

/// 送信されたイベントを記録するだけの MessagePusher
///
/// `broadcast` / `push_to` の対象と JSON ペイロードを保持し、テストから
/// 検証できるようにする。
#[derive(Default)]
pub(crate) struct RecordingPusher {
    broadcasts: Mutex<Vec<(Vec<ConnectionId>, String)>>,
    pushes: Mutex<Vec<(ConnectionId, String)>>,
}

impl RecordingPusher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 記録された全ブロードキャスト（対象, ペイロード）
    pub(crate) async fn broadcasts(&self) -> Vec<(Vec<ConnectionId>, String)> {
        self.broadcasts.lock().await.clone()
    }

    /// ペイロードに部分文字列を含むブロードキャストのみ
    pub(crate) async fn broadcasts_containing(
        &self,
        needle: &str,
    ) -> Vec<(Vec<ConnectionId>, String)> {
        self.broadcasts
            .lock()
            .await
            .iter()
            .filter(|(_, payload)| payload.contains(needle))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_connection(&self, _connection_id: ConnectionId, _sender: PusherChannel) {}

    async fn unregister_connection(&self, _connection_id: &ConnectionId) {}

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError> {
        self.pushes
            .lock()
            .await
            .push((*connection_id, content.to_string()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), PushError> {
        self.broadcasts
            .lock()
            .await
            .push((targets, content.to_string()));
        Ok(())
    }
}
