//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_conversation, debug_state, health_check, list_conversations, mark_read,
        message_history, post_message, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Realtime chat server
///
/// # Example
///
/// ```ignore
/// let state = AppState::build(store, verifier);
/// let server = Server::new(state);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Build the axum application.
    ///
    /// インプロセスの結合テストからも使えるよう、run から分離している。
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/debug/state", get(debug_state))
            .route("/api/health", get(health_check))
            .route(
                "/api/conversations",
                get(list_conversations).post(create_conversation),
            )
            .route(
                "/api/conversations/{conversation_id}/messages",
                get(message_history).post(post_message),
            )
            .route("/api/conversations/{conversation_id}/read", post(mark_read))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the realtime chat server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
