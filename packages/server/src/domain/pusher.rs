//! MessagePusher trait 定義
//!
//! クライアントへのイベント送信の抽象化。UseCase 層はこの trait にだけ
//! 依存し、WebSocket の詳細は Infrastructure 層が持ちます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::errors::PushError;
use super::value_object::ConnectionId;

/// 接続ごとの送信チャンネル
///
/// WebSocket の送信側タスクがこのチャンネルの受信側を持ち、ここに積まれた
/// JSON 文字列をソケットへ書き込む。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Message pusher trait
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録する
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを破棄する
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 単一の接続へイベントを送信する
    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError>;

    /// 複数の接続へイベントを送信する
    ///
    /// 個々の接続への送信失敗はログに残してスキップする（ベストエフォート）。
    /// 一部が失敗しても残りの接続への配信は継続される。
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str)
        -> Result<(), PushError>;
}
