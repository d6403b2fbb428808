//! Credential verification boundary.
//!
//! Token issuance belongs to the marketplace auth service. The chat core
//! only checks, once at handshake time, that the presented credential is
//! acceptable for the claimed identity.

use async_trait::async_trait;

use super::value_object::UserId;

/// Verifies the handshake credential for a claimed user identity.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// True iff `token` authenticates `user`.
    async fn verify(&self, user: &UserId, token: &str) -> bool;
}
