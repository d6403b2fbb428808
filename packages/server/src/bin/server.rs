//! Realtime chat server for the marketplace messaging core.
//!
//! Serves the WebSocket endpoint for realtime events plus the REST API for
//! conversations, messages and read receipts.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin renraku-server
//! cargo run --bin renraku-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use renraku_server::{
    domain::{ConversationStore, CredentialVerifier},
    infrastructure::{auth::OpaqueTokenVerifier, store::InMemoryConversationStore},
    ui::{AppState, Server},
};
use renraku_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "renraku-server")]
#[command(about = "Realtime chat server with presence and unread tracking", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. ConversationStore (in-memory database)
    // 2. CredentialVerifier
    // 3. AppState (registries, pusher, use cases)
    // 4. Server

    // 1. Create ConversationStore
    let store: Arc<dyn ConversationStore> =
        Arc::new(InMemoryConversationStore::new(Arc::new(SystemClock)));

    // 2. Create CredentialVerifier
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(OpaqueTokenVerifier);

    // 3. Create AppState
    let state = AppState::build(store, verifier);

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
