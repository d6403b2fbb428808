//! ConversationStore trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 本番環境では会話とメッセージの永続化は外部のデータサービスが担います。
//! この trait はそのサービスへの境界であり、チャットコアは永続化の成功を
//! 確認してからブロードキャストを行います（永続化されていないメッセージは
//! 決して配信しない）。

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{ChatMessage, Conversation, MessageId, ParticipantRole};
use super::errors::StoreError;
use super::value_object::{ConversationId, MessageContent, UserId};

/// Conversation store trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には
/// 依存しない。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// 会話を新規作成する
    async fn create_conversation(
        &self,
        company: UserId,
        freelancer: UserId,
    ) -> Result<Conversation, StoreError>;

    /// 会話を取得する
    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError>;

    /// ユーザーが参加している会話の一覧を取得する（更新日時の降順）
    async fn conversations_for(&self, user: &UserId) -> Vec<Conversation>;

    /// メッセージを永続化する
    ///
    /// サーバー側でメッセージ ID とタイムスタンプを採番し、相手側の未読
    /// カウンタとプレビューを更新した上で、正規のメッセージレコードを返す。
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        sender: UserId,
        content: MessageContent,
        attachment: Option<String>,
    ) -> Result<ChatMessage, StoreError>;

    /// メッセージの配信状態を Delivered に進める
    ///
    /// 配信パイプラインがルームメンバーへのファンアウトを完了した後に
    /// 呼ばれる。
    async fn mark_delivered(
        &self,
        conversation_id: &ConversationId,
        message_id: MessageId,
    ) -> Result<(), StoreError>;

    /// 会話のメッセージ履歴を取得する（永続化順）
    async fn message_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// 指定ロールの未読カウンタを 0 にリセットする
    ///
    /// 更新後の会話を返す。
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        role: ParticipantRole,
    ) -> Result<Conversation, StoreError>;
}
