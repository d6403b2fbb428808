//! Credential verifier implementations.

use async_trait::async_trait;

use crate::domain::{CredentialVerifier, UserId};

/// Development verifier: accepts any non-empty opaque token.
///
/// Token issuance and real verification belong to the marketplace auth
/// service; deployments wire their own [`CredentialVerifier`] here.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueTokenVerifier;

#[async_trait]
impl CredentialVerifier for OpaqueTokenVerifier {
    async fn verify(&self, user: &UserId, token: &str) -> bool {
        let ok = !token.trim().is_empty();
        if !ok {
            tracing::warn!("Rejected empty credential for user '{}'", user);
        }
        ok
    }
}
