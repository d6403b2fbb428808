//! Shared utilities for the Renraku chat system.
//!
//! This crate holds the pieces both the server and the client need:
//! logging setup and time utilities.

pub mod logger;
pub mod time;
