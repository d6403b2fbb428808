//! HTTP API request/response DTOs.
//!
//! `MessageDto` and `ConversationSummaryDto` double as WebSocket payloads:
//! the same record a REST call returns is the one broadcast to room members,
//! so clients can deduplicate by message id across the two surfaces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery state of a message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStateDto {
    Sent,
    Delivered,
    Read,
}

/// One chat message as exposed over HTTP and WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    /// Server-assigned Unix timestamp in milliseconds.
    pub sent_at: i64,
    pub state: DeliveryStateDto,
}

/// Conversation summary for the list view: participants, preview and the
/// per-role unread counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummaryDto {
    pub conversation_id: String,
    pub company_id: String,
    pub freelancer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_preview: Option<String>,
    pub company_unread: u32,
    pub freelancer_unread: u32,
    pub updated_at: i64,
}

/// Request body for `POST /api/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub company_id: String,
    pub freelancer_id: String,
}

/// Request body for `POST /api/conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub sender_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attachment: Option<String>,
}

/// Request body for `POST /api/conversations/{id}/read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub user_id: String,
}

/// Query string for requests scoped to the authenticated user.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}
