//! Error types for the chat domain.

use thiserror::Error;

/// Validation failure while constructing a value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("conversation id must not be empty")]
    EmptyConversationId,

    #[error("message content must not be empty")]
    EmptyMessageContent,

    #[error("message content too long: {0} characters")]
    MessageTooLong(usize),
}

/// Connection registry failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The transport assigns connection identifiers, so a collision means an
    /// invariant was violated somewhere upstream.
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// Conversation store failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("conversation between '{0}' and '{1}' already exists")]
    DuplicateConversation(String, String),

    #[error("message history capacity exceeded for conversation '{0}'")]
    HistoryCapacityExceeded(String),

    #[error("user '{0}' is not a participant of conversation '{1}'")]
    NotAParticipant(String, String),
}

/// Message push failure for a single connection.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
