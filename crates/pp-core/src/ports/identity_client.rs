//! Identity provider port
//!
//! Wraps the third-party identity provider: credential sign-in/sign-up,
//! provider-delegated sign-in, sign-out, token minting and the identity
//! change stream.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::IdentityError;
use crate::identity::{BearerToken, Identity, IdentitySnapshot, ProviderSignIn};

#[async_trait]
pub trait IdentityClientPort: Send + Sync {
    /// Credential sign-in.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Create a new identity with credentials.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Set the provider-side display name of `identity`.
    async fn update_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> Result<(), IdentityError>;

    /// Provider-hosted sign-in. `Ok(None)` means the user cancelled the flow.
    async fn sign_in_with_provider(&self) -> Result<Option<ProviderSignIn>, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Mint a fresh bearer token for `identity`. Never served from a cache.
    async fn mint_token(&self, identity: &Identity) -> Result<BearerToken, IdentityError>;

    /// Subscribe to identity changes. The receiver starts at the current snapshot.
    fn subscribe(&self) -> watch::Receiver<IdentitySnapshot>;
}
