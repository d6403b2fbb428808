//! Real-time chat and presence server for the Renraku freelance marketplace.
//!
//! This crate implements the messaging core: connection registry, presence
//! tracking, per-conversation room membership, message delivery with unread
//! counters, and a typing-indicator relay, all over a WebSocket transport.
//!
//! Account, job and application CRUD live in a separate service; this crate
//! only consumes their data through the [`domain::ConversationStore`] and
//! [`domain::CredentialVerifier`] boundaries.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
