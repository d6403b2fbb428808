//! UseCase 層のエラー型定義

use thiserror::Error;

use crate::domain::StoreError;

/// セッション接続時のエラー
#[derive(Debug, Error)]
pub enum ConnectError {
    /// ハンドシェイク時の資格情報が不正
    #[error("invalid credential for user '{0}'")]
    InvalidCredential(String),

    /// 接続 ID の衝突（トランスポートが採番するため本来発生しない）
    #[error("duplicate connection id '{0}'")]
    DuplicateConnection(String),
}

/// ルーム参加時のエラー
#[derive(Debug, Error)]
pub enum ChatJoinError {
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    /// 会話の参加者でないユーザーからの参加要求。ルーム台帳に到達する前に
    /// この境界で拒否される。
    #[error("user '{0}' is not a participant of conversation '{1}'")]
    NotAParticipant(String, String),
}

/// メッセージ送信時のエラー
#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("user '{0}' is not a participant of conversation '{1}'")]
    NotAParticipant(String, String),

    /// 永続化失敗。永続化されなかったメッセージは決して配信されない。
    #[error("failed to persist message: {0}")]
    PersistFailed(StoreError),
}

/// 既読化時のエラー
#[derive(Debug, Error)]
pub enum MarkReadError {
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("user '{0}' is not a participant of conversation '{1}'")]
    NotAParticipant(String, String),
}

/// 会話作成時のエラー
#[derive(Debug, Error)]
pub enum CreateConversationError {
    #[error("conversation between '{0}' and '{1}' already exists")]
    AlreadyExists(String, String),

    #[error("failed to create conversation: {0}")]
    StoreFailed(StoreError),
}

/// 履歴取得時のエラー
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("user '{0}' is not a participant of conversation '{1}'")]
    NotAParticipant(String, String),
}
