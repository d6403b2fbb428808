//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` の管理
//! - 接続へのイベント送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、イベント送信にのみ使用します。
//! キーはユーザー ID ではなく接続 ID です。同一ユーザーの複数タブは
//! それぞれ独立した接続としてここに登録されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

/// WebSocket message pusher keyed by connection id.
#[derive(Default)]
pub struct WebSocketMessagePusher {
    connections: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(connection_id) {
            sender
                .send(content.to_string())
                .map_err(|e| PushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed event to connection '{}'", connection_id);
            Ok(())
        } else {
            Err(PushError::ConnectionNotFound(connection_id.to_string()))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), PushError> {
        let connections = self.connections.lock().await;

        for target in targets {
            if let Some(sender) = connections.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容し、残りへの配信を
                // 継続する
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push event to connection '{}': {}", target, e);
                } else {
                    tracing::debug!("Broadcasted event to connection '{}'", target);
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target
                );
            }
        }

        Ok(())
    }
}
