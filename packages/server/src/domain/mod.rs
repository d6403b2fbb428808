//! Domain layer: entities, value objects and the interfaces the use case
//! layer depends on.
//!
//! The registries in this module are pure synchronous state machines. They
//! hold no locks themselves; the caller wraps them in a `tokio::sync::Mutex`
//! and every mutation returns the resulting transition so that presence
//! recomputation happens in the same logical step as the mutation.

mod auth;
mod entity;
mod errors;
mod pusher;
mod registry;
mod roster;
mod store;
mod value_object;

pub use auth::CredentialVerifier;
pub use entity::{ChatMessage, Conversation, DeliveryState, MessageId, ParticipantRole};
pub use errors::{PushError, RegistryError, StoreError, ValueError};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::{ConnectionRegistry, PresenceTransition};
pub use roster::RoomRoster;
pub use store::ConversationStore;
pub use value_object::{ConnectionId, ConversationId, MessageContent, Timestamp, UserId};

#[cfg(test)]
pub use store::MockConversationStore;
