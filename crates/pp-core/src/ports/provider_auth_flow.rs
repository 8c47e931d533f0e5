use async_trait::async_trait;

use crate::error::IdentityError;
use crate::identity::ProviderCredential;

/// Provider-hosted interactive sign-in (e.g. a Google account picker).
///
/// Returns `Ok(None)` when the user dismisses the flow.
#[async_trait]
pub trait ProviderAuthFlowPort: Send + Sync {
    async fn authorize(&self) -> Result<Option<ProviderCredential>, IdentityError>;
}
