//! # Application Runtime
//!
//! [`AppRuntime`] owns the wired session controller, navigation resolver and
//! identity client, and drives their start-up order:
//!
//! ```text
//! controller.init()      follow identity snapshots
//! resolver.start()       read onboarding flag, follow session presence
//! identity.restore()     publish the persisted provider session
//! ```
//!
//! Restoring last makes the first resolved presence come from the persisted
//! identity rather than from a race with the subscribers.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, info_span, Instrument};

use pp_app::{CompleteOnboarding, NavigationHandle, NavigationStateResolver, SessionController};
use pp_core::ports::{IdentityClientPort, SessionStorePort};
use pp_core::{IdentitySnapshot, NavigationState};
use pp_infra::RestIdentityClient;

/// Application runtime with dependencies.
///
/// 应用运行时：持有会话控制器、导航解析器与身份客户端。
pub struct AppRuntime {
    identity: Arc<RestIdentityClient>,
    controller: Arc<SessionController>,
    resolver: NavigationStateResolver,
    store: Arc<dyn SessionStorePort>,
    started: Mutex<bool>,
}

impl AppRuntime {
    pub fn new(
        identity: Arc<RestIdentityClient>,
        controller: Arc<SessionController>,
        resolver: NavigationStateResolver,
        store: Arc<dyn SessionStorePort>,
    ) -> Self {
        Self {
            identity,
            controller,
            resolver,
            store,
            started: Mutex::new(false),
        }
    }

    /// Start the session core. Calling it again is a no-op.
    pub async fn init(&self) -> IdentitySnapshot {
        let span = info_span!("runtime.init");
        async {
            let mut started = self.started.lock().await;
            if *started {
                return self.identity.subscribe().borrow().clone();
            }

            self.controller.init().await;
            self.resolver.start().await;
            let snapshot = self.identity.restore().await;
            *started = true;

            info!(
                signed_in = snapshot.identity().is_some(),
                "runtime started"
            );
            snapshot
        }
        .instrument(span)
        .await
    }

    /// Stop background tasks. Persisted state is left untouched and the
    /// runtime cannot be started again.
    pub async fn dispose(&self) {
        self.resolver.dispose().await;
        self.controller.dispose().await;
        info!("runtime disposed");
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn navigation(&self) -> NavigationHandle {
        self.resolver.handle()
    }

    pub fn subscribe_navigation(&self) -> watch::Receiver<Option<NavigationState>> {
        self.resolver.subscribe()
    }

    pub fn complete_onboarding(&self) -> CompleteOnboarding {
        CompleteOnboarding::new(self.store.clone(), self.resolver.handle())
    }
}
