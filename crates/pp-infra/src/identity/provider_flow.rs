//! Provider-hosted sign-in flows.
//!
//! The interactive account picker lives in the UI shell; these adapters cover
//! headless hosts and tests.

use async_trait::async_trait;
use pp_core::ports::ProviderAuthFlowPort;
use pp_core::{AuthErrorKind, IdentityError, ProviderCredential};

/// Used when the host has no interactive provider sign-in.
pub struct DisabledProviderAuthFlow;

#[async_trait]
impl ProviderAuthFlowPort for DisabledProviderAuthFlow {
    async fn authorize(&self) -> Result<Option<ProviderCredential>, IdentityError> {
        Err(IdentityError::new(
            AuthErrorKind::Unknown,
            "provider sign-in is not available on this host",
        ))
    }
}

/// Returns a fixed credential, e.g. one obtained out of band by a CLI host.
pub struct StaticProviderAuthFlow {
    credential: Option<ProviderCredential>,
}

impl StaticProviderAuthFlow {
    pub fn new(credential: Option<ProviderCredential>) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl ProviderAuthFlowPort for StaticProviderAuthFlow {
    async fn authorize(&self) -> Result<Option<ProviderCredential>, IdentityError> {
        Ok(self.credential.clone())
    }
}
