//! Scoped room membership.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use renraku_server::infrastructure::dto::websocket::ClientEvent;

/// Guard for an open conversation.
///
/// 生成時に `chat-join` を送り、drop 時に必ず `chat-leave` を送る。
/// 画面遷移やエラーパスでの leave 漏れをスコープで防ぐ。開いている
/// 会話の集合は再接続時の再 join のためにセッションと共有する。
pub struct RoomGuard {
    conversation_id: String,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    open_rooms: Arc<Mutex<HashSet<String>>>,
}

impl RoomGuard {
    pub(crate) fn new(
        conversation_id: String,
        outbound: mpsc::UnboundedSender<ClientEvent>,
        open_rooms: Arc<Mutex<HashSet<String>>>,
    ) -> Self {
        {
            let mut rooms = open_rooms.lock().expect("open_rooms lock poisoned");
            rooms.insert(conversation_id.clone());
        }
        let _ = outbound.send(ClientEvent::ChatJoin {
            conversation_id: conversation_id.clone(),
        });

        Self {
            conversation_id,
            outbound,
            open_rooms,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        if let Ok(mut rooms) = self.open_rooms.lock() {
            rooms.remove(&self.conversation_id);
        }
        // Connection may already be gone; leave is then implied server-side
        let _ = self.outbound.send(ClientEvent::ChatLeave {
            conversation_id: self.conversation_id.clone(),
        });
    }
}
