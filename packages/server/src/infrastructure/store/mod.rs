//! Conversation store implementations.

mod inmemory;

pub use inmemory::InMemoryConversationStore;
