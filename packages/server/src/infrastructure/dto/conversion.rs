//! Conversion logic between DTOs and domain entities.

use crate::domain::{ChatMessage, Conversation, DeliveryState, ParticipantRole};
use crate::infrastructure::dto::http as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<DeliveryState> for dto::DeliveryStateDto {
    fn from(state: DeliveryState) -> Self {
        match state {
            DeliveryState::Sent => dto::DeliveryStateDto::Sent,
            DeliveryState::Delivered => dto::DeliveryStateDto::Delivered,
            DeliveryState::Read => dto::DeliveryStateDto::Read,
        }
    }
}

impl From<ChatMessage> for dto::MessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id.as_uuid(),
            conversation_id: message.conversation_id.into_string(),
            sender_id: message.sender.into_string(),
            content: message.content.into_string(),
            attachment: message.attachment,
            sent_at: message.sent_at.value(),
            state: message.state.into(),
        }
    }
}

impl From<Conversation> for dto::ConversationSummaryDto {
    fn from(conversation: Conversation) -> Self {
        Self {
            last_preview: conversation.last_preview().map(str::to_string),
            company_unread: conversation.unread(ParticipantRole::Company),
            freelancer_unread: conversation.unread(ParticipantRole::Freelancer),
            updated_at: conversation.updated_at.value(),
            conversation_id: conversation.id.into_string(),
            company_id: conversation.company.into_string(),
            freelancer_id: conversation.freelancer.into_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConversationId, MessageContent, MessageId, Timestamp, UserId};

    #[test]
    fn test_domain_chat_message_to_dto() {
        // テスト項目: ドメインの ChatMessage が DTO に変換される
        // given (前提条件):
        let id = MessageId::generate();
        let message = ChatMessage {
            id,
            conversation_id: ConversationId::new("conv-1".to_string()).unwrap(),
            sender: UserId::new("acme".to_string()).unwrap(),
            content: MessageContent::new("Hello!".to_string()).unwrap(),
            attachment: Some("resume.pdf".to_string()),
            sent_at: Timestamp::new(2000),
            state: DeliveryState::Sent,
        };

        // when (操作):
        let dto: dto::MessageDto = message.into();

        // then (期待する結果):
        assert_eq!(dto.id, id.as_uuid());
        assert_eq!(dto.conversation_id, "conv-1");
        assert_eq!(dto.sender_id, "acme");
        assert_eq!(dto.content, "Hello!");
        assert_eq!(dto.attachment.as_deref(), Some("resume.pdf"));
        assert_eq!(dto.sent_at, 2000);
        assert_eq!(dto.state, dto::DeliveryStateDto::Sent);
    }

    #[test]
    fn test_domain_conversation_to_summary_dto() {
        // テスト項目: ドメインの Conversation がサマリ DTO に変換される
        // given (前提条件):
        let mut conversation = Conversation::new(
            ConversationId::new("conv-1".to_string()).unwrap(),
            UserId::new("acme".to_string()).unwrap(),
            UserId::new("yuki".to_string()).unwrap(),
            Timestamp::new(1000),
        );
        let content = MessageContent::new("Hi there".to_string()).unwrap();
        conversation.record_message(ParticipantRole::Company, &content, Timestamp::new(2000));

        // when (操作):
        let dto: dto::ConversationSummaryDto = conversation.into();

        // then (期待する結果):
        assert_eq!(dto.conversation_id, "conv-1");
        assert_eq!(dto.company_id, "acme");
        assert_eq!(dto.freelancer_id, "yuki");
        assert_eq!(dto.last_preview.as_deref(), Some("Hi there"));
        assert_eq!(dto.company_unread, 0);
        assert_eq!(dto.freelancer_unread, 1);
        assert_eq!(dto.updated_at, 2000);
    }
}
