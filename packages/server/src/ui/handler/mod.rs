//! HTTP / WebSocket endpoint handlers.

mod http;
mod websocket;

pub use http::{
    create_conversation, debug_state, health_check, list_conversations, mark_read,
    message_history, post_message,
};
pub use websocket::websocket_handler;
