//! UI layer: the axum router, WebSocket/HTTP handlers and shared state.

pub mod handler;
mod server;
mod signal;
mod state;

pub use server::Server;
pub use state::AppState;
