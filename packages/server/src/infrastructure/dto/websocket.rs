//! WebSocket event DTOs.
//!
//! Every event on the wire is one variant of a serde-tagged enum with a
//! fixed required-field set, so a malformed payload fails at deserialization
//! time instead of surfacing as a missing-field panic later.

use serde::{Deserialize, Serialize};

use super::http::{ConversationSummaryDto, MessageDto};

/// Events sent by the client over the WebSocket.
///
/// Session join is not an event: the identity credential travels in the
/// handshake query and is validated exactly once at upgrade time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Start receiving room-scoped events for the conversation.
    ChatJoin { conversation_id: String },
    /// Stop receiving room-scoped events for the conversation.
    ChatLeave { conversation_id: String },
    /// The user started typing in the conversation.
    TypingStart { conversation_id: String },
    /// The user stopped typing in the conversation.
    TypingStop { conversation_id: String },
}

/// Events sent by the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent once right after the handshake: the current presence snapshot.
    /// Afterwards the client maintains its set purely from `user-online` /
    /// `user-offline` events.
    SessionReady { online_users: Vec<String> },
    /// A new message, delivered to current room members only.
    MessageReceive { message: MessageDto },
    /// A brand-new conversation, delivered to all connections of both
    /// participants.
    ChatCreated { summary: ConversationSummaryDto },
    /// Preview/unread-count change, delivered to all connections of both
    /// participants regardless of room membership.
    ChatUpdated { summary: ConversationSummaryDto },
    UserOnline { user_id: String },
    UserOffline { user_id: String },
    UserTyping { conversation_id: String, user_id: String },
    UserStoppedTyping { conversation_id: String, user_id: String },
}

impl ServerEvent {
    /// Serialize for the wire. Event DTOs contain only serializable fields,
    /// so this cannot fail.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("ServerEvent is always serializable")
    }
}

impl ClientEvent {
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("ClientEvent is always serializable")
    }
}
