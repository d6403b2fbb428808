//! Value objects for the chat domain.
//!
//! Identifiers coming in over the wire are validated once at the boundary
//! and carried as these types everywhere inside the crate.

use std::fmt;

use uuid::Uuid;

use super::errors::ValueError;

/// Maximum length of a chat message, in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Opaque identifier for one live transport connection.
///
/// Assigned by the server at WebSocket upgrade time, never by the client, so
/// it is unique within the registry for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of an authenticated marketplace user (company or freelancer
/// account). Issued by the account service; this crate only validates shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.trim().is_empty() {
            return Err(ValueError::EmptyUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a conversation between a company and a freelancer.
///
/// Conversations are persisted by the data layer; the identifier is opaque
/// to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.trim().is_empty() {
            return Err(ValueError::EmptyConversationId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.trim().is_empty() {
            return Err(ValueError::EmptyMessageContent);
        }
        let len = value.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(ValueError::MessageTooLong(len));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix timestamp in milliseconds (UTC), assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_rejects_empty_string() {
        // テスト項目: 空文字の UserId は拒否される
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueError::EmptyUserId)));
    }

    #[test]
    fn test_user_id_accepts_normal_string() {
        // テスト項目: 通常の文字列から UserId が生成できる
        // given (前提条件):
        let value = "company-42".to_string();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "company-42");
    }

    #[test]
    fn test_message_content_rejects_too_long() {
        // テスト項目: 上限を超えるメッセージ本文は拒否される
        // given (前提条件):
        let value = "a".repeat(MAX_MESSAGE_LEN + 1);

        // when (操作):
        let result = MessageContent::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueError::MessageTooLong(_))));
    }

    #[test]
    fn test_message_content_accepts_max_length() {
        // テスト項目: ちょうど上限の長さのメッセージ本文は受理される
        // given (前提条件):
        let value = "a".repeat(MAX_MESSAGE_LEN);

        // when (操作):
        let result = MessageContent::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_connection_id_is_unique() {
        // テスト項目: 生成される ConnectionId は一意である
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
