//! Domain entities: conversations and chat messages.

use std::fmt;

use uuid::Uuid;

use super::value_object::{ConversationId, MessageContent, Timestamp, UserId};

/// Number of characters of a message body kept as the conversation preview.
const PREVIEW_LEN: usize = 80;

/// Server-assigned message identifier.
///
/// Clients deduplicate incoming messages by this id, so it must be assigned
/// exactly once, at persistence time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Persisted, not yet handed to any recipient connection.
    Sent,
    /// Handed to at least one recipient connection.
    Delivered,
    /// The counterpart marked the conversation as read.
    Read,
}

/// The two sides of a hiring conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Company,
    Freelancer,
}

impl ParticipantRole {
    /// The other side of the conversation.
    pub fn counterpart(&self) -> ParticipantRole {
        match self {
            ParticipantRole::Company => ParticipantRole::Freelancer,
            ParticipantRole::Freelancer => ParticipantRole::Company,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Company => "company",
            ParticipantRole::Freelancer => "freelancer",
        }
    }
}

/// One persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub content: MessageContent,
    pub attachment: Option<String>,
    pub sent_at: Timestamp,
    pub state: DeliveryState,
}

/// A conversation between a company and a freelancer.
///
/// The record itself is owned by the external data layer; this entity holds
/// the projection the chat core needs: the two participants and their
/// independent unread counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub company: UserId,
    pub freelancer: UserId,
    company_unread: u32,
    freelancer_unread: u32,
    last_preview: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn new(
        id: ConversationId,
        company: UserId,
        freelancer: UserId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            company,
            freelancer,
            company_unread: 0,
            freelancer_unread: 0,
            last_preview: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Which side of the conversation the given user is, if any.
    pub fn role_of(&self, user: &UserId) -> Option<ParticipantRole> {
        if &self.company == user {
            Some(ParticipantRole::Company)
        } else if &self.freelancer == user {
            Some(ParticipantRole::Freelancer)
        } else {
            None
        }
    }

    /// The user occupying the given role.
    pub fn participant(&self, role: ParticipantRole) -> &UserId {
        match role {
            ParticipantRole::Company => &self.company,
            ParticipantRole::Freelancer => &self.freelancer,
        }
    }

    /// Both participants, company first.
    pub fn participants(&self) -> [&UserId; 2] {
        [&self.company, &self.freelancer]
    }

    pub fn unread(&self, role: ParticipantRole) -> u32 {
        match role {
            ParticipantRole::Company => self.company_unread,
            ParticipantRole::Freelancer => self.freelancer_unread,
        }
    }

    pub fn last_preview(&self) -> Option<&str> {
        self.last_preview.as_deref()
    }

    /// Record a new message authored by `sender_role`.
    ///
    /// Increments the counterpart role's unread counter and refreshes the
    /// preview. The counter rises whether or not the counterpart currently
    /// has the conversation open; "has new messages" is decoupled from
    /// "is currently viewing".
    pub fn record_message(&mut self, sender_role: ParticipantRole, content: &MessageContent, at: Timestamp) {
        match sender_role.counterpart() {
            ParticipantRole::Company => self.company_unread += 1,
            ParticipantRole::Freelancer => self.freelancer_unread += 1,
        }
        self.last_preview = Some(truncate_preview(content.as_str()));
        self.updated_at = at;
    }

    /// Reset the given role's unread counter to zero.
    pub fn mark_read(&mut self, role: ParticipantRole) {
        match role {
            ParticipantRole::Company => self.company_unread = 0,
            ParticipantRole::Freelancer => self.freelancer_unread = 0,
        }
    }
}

fn truncate_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_LEN {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(PREVIEW_LEN).collect();
        format!("{}…", truncated)
    }
}
