//! Error types for the chat client.

use std::time::Duration;

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the handshake credential
    #[error("Authentication rejected for user '{0}'")]
    AuthRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A single connect attempt exceeded its deadline
    #[error("Connect attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// REST request failed at the transport level
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    /// REST request completed with a non-success status
    #[error("API request returned status {0}")]
    ApiStatus(reqwest::StatusCode),

    /// Reconnection attempts exhausted
    #[error("Gave up after {0} reconnect attempts")]
    GaveUp(u32),
}
