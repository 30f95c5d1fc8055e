//! Re-authentication contract for sensitive mutations.

use async_trait::async_trait;

/// Challenge collaborator consulted before a gated mutation.
///
/// The challenge UI (biometric or credential prompt) lives outside the
/// engine; the engine only awaits the outcome. A declined or cancelled
/// challenge simply means the mutation does not run.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Present the challenge. Returns `true` when it succeeds.
    async fn challenge(&self) -> bool;
}

/// Authenticator used when no challenge UI is wired; always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChallenge;

#[async_trait]
impl Authenticator for NoChallenge {
    async fn challenge(&self) -> bool {
        true
    }
}
