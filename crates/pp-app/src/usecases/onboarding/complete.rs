use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use pp_core::ports::SessionStorePort;

use crate::usecases::navigation::NavigationHandle;

/// Use case for completing first-run onboarding.
///
/// Persists the onboarding flag, then tells the navigation resolver so the
/// route moves on without waiting for a restart.
pub struct CompleteOnboarding {
    store: Arc<dyn SessionStorePort>,
    navigation: Option<NavigationHandle>,
}

impl CompleteOnboarding {
    /// Create a new CompleteOnboarding use case from trait objects.
    pub fn new(store: Arc<dyn SessionStorePort>, navigation: NavigationHandle) -> Self {
        Self {
            store,
            navigation: Some(navigation),
        }
    }

    /// Create the use case without a running resolver (flag only).
    pub fn from_ports(store: Arc<dyn SessionStorePort>) -> Self {
        Self {
            store,
            navigation: None,
        }
    }

    /// Mark onboarding as complete. The flag is never reverted.
    pub async fn execute(&self) -> anyhow::Result<()> {
        self.store
            .set_onboarding_completed(true)
            .await
            .context("persist onboarding flag failed")?;

        if let Some(navigation) = &self.navigation {
            navigation.onboarding_completed();
        }
        info!("onboarding completed");
        Ok(())
    }
}
