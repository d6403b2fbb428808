//! Client-side session facade for the Renraku realtime chat core.
//!
//! [`ChatSession`] owns one WebSocket connection per authenticated session,
//! reconnects with bounded backoff, and republishes server events through
//! typed subscription channels. REST access goes through [`ApiClient`].

pub mod api;
pub mod dedup;
pub mod error;
pub mod formatter;
pub mod reconnect;
pub mod room;
pub mod session;
pub mod typing;
pub mod ui;

pub use api::ApiClient;
pub use dedup::MessageDeduper;
pub use error::ClientError;
pub use reconnect::{ConnectionState, ReconnectPolicy};
pub use room::RoomGuard;
pub use session::{ChatSession, PresenceEvent, SessionConfig, TypingEvent};
pub use typing::TypingNotifier;
