//! Infrastructure layer: concrete implementations of the domain interfaces
//! plus wire/HTTP data transfer objects.

pub mod auth;
pub mod dto;
pub mod pusher;
pub mod store;
