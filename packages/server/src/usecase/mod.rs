//! UseCase layer: one struct per operation of the chat core.
//!
//! Each use case owns `Arc`s to the shared registries and the domain
//! interfaces it needs; the UI layer only dispatches.

mod connect_session;
mod create_conversation;
mod deliver_message;
mod disconnect_session;
mod error;
mod join_chat;
mod leave_chat;
mod list_conversations;
mod mark_read;
mod message_history;
mod typing_relay;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_session::ConnectSessionUseCase;
pub use create_conversation::CreateConversationUseCase;
pub use deliver_message::DeliverMessageUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{
    ChatJoinError, ConnectError, CreateConversationError, HistoryError, MarkReadError,
    SendMessageError,
};
pub use join_chat::JoinChatUseCase;
pub use leave_chat::LeaveChatUseCase;
pub use list_conversations::ListConversationsUseCase;
pub use mark_read::MarkReadUseCase;
pub use message_history::MessageHistoryUseCase;
pub use typing_relay::TypingRelayUseCase;
