//! Message formatting utilities for client display.

use renraku_server::infrastructure::dto::http::{ConversationSummaryDto, MessageDto};
use renraku_shared::time::millis_to_rfc3339;

use crate::session::PresenceEvent;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an incoming chat message
    pub fn format_message(message: &MessageDto) -> String {
        let timestamp_str = millis_to_rfc3339(message.sent_at);
        let attachment = match &message.attachment {
            Some(reference) => format!("\n [attachment: {}]", reference),
            None => String::new(),
        };
        format!(
            "\n\n------------------------------------------------------------\n\
             [{}] @{}: {}{}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            message.conversation_id, message.sender_id, message.content, attachment, timestamp_str
        )
    }

    /// Format a presence change notification
    pub fn format_presence(event: &PresenceEvent) -> String {
        match event {
            PresenceEvent::Snapshot(users) => {
                let mut output = String::new();
                output.push_str("\n============================================================\n");
                output.push_str("Online now:\n");
                if users.is_empty() {
                    output.push_str("(nobody)\n");
                } else {
                    for user in users {
                        output.push_str(&format!("  {}\n", user));
                    }
                }
                output.push_str("============================================================\n");
                output
            }
            PresenceEvent::Online(user) => format!("\n+ {} is online\n", user),
            PresenceEvent::Offline(user) => format!("\n- {} went offline\n", user),
        }
    }

    /// Format a conversation summary line for the list view
    pub fn format_summary(summary: &ConversationSummaryDto, user_id: &str) -> String {
        let unread = if user_id == summary.company_id {
            summary.company_unread
        } else {
            summary.freelancer_unread
        };
        let preview = summary.last_preview.as_deref().unwrap_or("(no messages)");
        format!(
            "\n[{}] {} <-> {} | {} unread | {} | updated {}\n",
            summary.conversation_id,
            summary.company_id,
            summary.freelancer_id,
            unread,
            preview,
            millis_to_rfc3339(summary.updated_at)
        )
    }

    /// Format a typing signal
    pub fn format_typing(conversation_id: &str, user_id: &str, typing: bool) -> String {
        if typing {
            format!("\n[{}] {} is typing...\n", conversation_id, user_id)
        } else {
            format!("\n[{}] {} stopped typing\n", conversation_id, user_id)
        }
    }

    /// Format a confirmation after posting a message
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        format!("sent at {}\n", millis_to_rfc3339(sent_at))
    }
}
