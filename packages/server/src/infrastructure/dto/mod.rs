//! Data Transfer Objects (DTOs) for the chat core.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event DTOs (tagged enums, one variant per event)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
