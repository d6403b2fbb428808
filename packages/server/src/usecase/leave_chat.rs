//! UseCase: ルーム退出処理

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConversationId, RoomRoster};

/// ルーム退出のユースケース
///
/// 退出は常に成功する。参加していないルームからの退出も冪等に扱う
/// （再接続やビューの二重クローズで自然に発生するため）。
pub struct LeaveChatUseCase {
    roster: Arc<Mutex<RoomRoster>>,
}

impl LeaveChatUseCase {
    pub fn new(roster: Arc<Mutex<RoomRoster>>) -> Self {
        Self { roster }
    }

    pub async fn execute(&self, connection_id: &ConnectionId, conversation_id: &ConversationId) {
        let mut roster = self.roster.lock().await;
        roster.leave(connection_id, conversation_id);
    }
}
