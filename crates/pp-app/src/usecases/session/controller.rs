//! Session controller.
//!
//! Owns the authoritative session state, reacts to identity provider events
//! and runs the reconcile algorithm against the backend:
//!
//! 1. mint a fresh token from the live identity
//! 2. persist it (kept even if the backend is down)
//! 3. `verify` to fetch-or-create the profile
//! 4. if name hints differ from the stored names, patch and re-fetch
//!
//! Backend failures, and a provider that cannot be reached, degrade the
//! session instead of failing the command. An identity the provider no
//! longer accepts ends the session and is reported to the caller. Every state-changing operation runs under the context's op
//! lock, so an identity callback and an explicit command never interleave.

use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use pp_core::ports::{IdentityClientPort, ProfileBackendPort, SessionStorePort};
use pp_core::{
    BackendError, BearerToken, Identity, IdentityError, IdentitySnapshot, NameHints,
    PendingWelcome, Profile, ProfilePatch, ProfileRead, SessionEvent, SessionPresence,
    SessionSnapshot, SessionState,
};

use super::config::SessionConfig;
use super::context::SessionContext;
use super::error::SessionError;
use crate::usecases::navigation::WelcomeNotifier;

/// Outcome of a provider-hosted sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderLogin {
    SignedIn(SessionSnapshot),
    /// The user dismissed the provider flow. Nothing changed.
    Cancelled,
}

/// What a failed reconcile does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    /// Drop the profile and move `Reconciling` to `Degraded`.
    Degrade,
    /// Leave the previous profile and state untouched.
    KeepProfile,
}

pub struct SessionController {
    identity: Arc<dyn IdentityClientPort>,
    backend: Arc<dyn ProfileBackendPort>,
    store: Arc<dyn SessionStorePort>,
    welcome: Option<WelcomeNotifier>,
    config: SessionConfig,
    context: SessionContext,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        identity: Arc<dyn IdentityClientPort>,
        backend: Arc<dyn ProfileBackendPort>,
        store: Arc<dyn SessionStorePort>,
        config: SessionConfig,
    ) -> Self {
        Self {
            identity,
            backend,
            store,
            welcome: None,
            config,
            context: SessionContext::new(),
            listener: Mutex::new(None),
        }
    }

    /// Deliver pending welcomes directly to the navigation resolver.
    pub fn with_welcome_notifier(mut self, notifier: WelcomeNotifier) -> Self {
        self.welcome = Some(notifier);
        self
    }

    /// Start following identity provider events. Calling it again is a no-op.
    pub async fn init(self: &Arc<Self>) {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            debug!("session controller already initialized");
            return;
        }

        let rx = self.identity.subscribe();
        let weak = Arc::downgrade(self);
        *listener = Some(tokio::spawn(follow_identity(weak, rx)));
        info!("session controller initialized");
    }

    /// Stop following identity provider events.
    pub async fn dispose(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            info!("session controller disposed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.context.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.context.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.context.state()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.context.snapshot().profile
    }

    /// Credential sign-in. Identity errors are returned for display.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionSnapshot, SessionError> {
        let span = info_span!("usecase.session.login");
        async {
            let _guard = self.context.acquire_op_lock().await;
            self.context.apply(SessionEvent::CredentialsSubmitted);

            let identity = match self.identity.sign_in(email, password).await {
                Ok(identity) => identity,
                Err(err) => {
                    self.context.apply(SessionEvent::AuthAborted);
                    warn!(kind = ?err.kind, error = %err, "login failed");
                    return Err(err.into());
                }
            };

            self.announce_welcome(PendingWelcome::returning_user(identity.display_name.clone()))
                .await;
            self.adopt(identity.clone());
            self.reconcile(&identity, None, OnFailure::Degrade).await?;
            Ok(self.context.snapshot())
        }
        .instrument(span)
        .await
    }

    /// Create an identity, then reconcile with the form's names as hints.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        hints: NameHints,
    ) -> Result<SessionSnapshot, SessionError> {
        let span = info_span!("usecase.session.register");
        async {
            let _guard = self.context.acquire_op_lock().await;
            self.context.apply(SessionEvent::CredentialsSubmitted);

            let mut identity = match self.identity.sign_up(email, password).await {
                Ok(identity) => identity,
                Err(err) => {
                    self.context.apply(SessionEvent::AuthAborted);
                    warn!(kind = ?err.kind, error = %err, "registration failed");
                    return Err(err.into());
                }
            };

            let display_name = hints.display_name();
            if !display_name.is_empty() {
                match self
                    .identity
                    .update_display_name(&identity, &display_name)
                    .await
                {
                    Ok(()) => identity.display_name = Some(display_name),
                    Err(err) => warn!(error = %err, "failed to set display name after sign-up"),
                }
            }

            let user_name = Some(hints.first_name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| identity.display_name.clone());
            self.announce_welcome(PendingWelcome::new_user(user_name)).await;
            self.adopt(identity.clone());
            self.reconcile(&identity, Some(&hints), OnFailure::Degrade)
                .await?;
            Ok(self.context.snapshot())
        }
        .instrument(span)
        .await
    }

    /// Provider-hosted sign-in. A dismissed flow is not an error and leaves
    /// both the session and storage untouched.
    pub async fn login_with_provider(&self) -> Result<ProviderLogin, SessionError> {
        let span = info_span!("usecase.session.login_with_provider");
        async {
            let _guard = self.context.acquire_op_lock().await;

            let outcome = match self.identity.sign_in_with_provider().await {
                Ok(Some(outcome)) => outcome,
                Ok(None) => {
                    info!("provider sign-in cancelled");
                    return Ok(ProviderLogin::Cancelled);
                }
                Err(err) if err.kind.is_cancellation() => {
                    info!("provider sign-in cancelled");
                    return Ok(ProviderLogin::Cancelled);
                }
                Err(err) => {
                    warn!(kind = ?err.kind, error = %err, "provider sign-in failed");
                    return Err(err.into());
                }
            };

            let identity = outcome.identity;
            let user_name = identity.display_name.clone();
            let welcome = if outcome.is_new_user {
                PendingWelcome::new_user(user_name)
            } else {
                PendingWelcome::returning_user(user_name)
            };
            self.announce_welcome(welcome).await;
            self.adopt(identity.clone());
            self.reconcile(&identity, None, OnFailure::Degrade).await?;
            Ok(ProviderLogin::SignedIn(self.context.snapshot()))
        }
        .instrument(span)
        .await
    }

    /// Sign out and clear local session data. Local clears always happen,
    /// whatever the provider says. Idempotent.
    pub async fn logout(&self) {
        let span = info_span!("usecase.session.logout");
        async {
            let _guard = self.context.acquire_op_lock().await;

            if let Err(err) = self.identity.sign_out().await {
                warn!(error = %err, "remote sign-out failed, clearing local session anyway");
            }
            if let Err(err) = self.store.clear_token().await {
                warn!(error = %err, "failed to clear cached token");
            }

            self.context.update(Some(SessionEvent::SignedOut), |snapshot| {
                snapshot.identity = None;
                snapshot.profile = None;
            });
        }
        .instrument(span)
        .await
    }

    /// Re-read the profile. Never fails: falls back to a full reconcile and,
    /// failing that, keeps whatever profile was known.
    pub async fn refresh_profile(&self) -> Option<Profile> {
        let span = info_span!("usecase.session.refresh_profile");
        async {
            let _guard = self.context.acquire_op_lock().await;
            let snapshot = self.context.snapshot();
            let Some(identity) = snapshot.identity else {
                debug!("refresh requested without a session");
                return None;
            };

            match snapshot.profile {
                Some(profile) => match self.fetch_fresh(&identity, &profile).await {
                    Ok(fresh) => self.publish_profile(fresh),
                    Err(err) => {
                        warn!(error = %err, "profile refresh failed, reconciling");
                        if let Err(err) = self
                            .reconcile(&identity, None, OnFailure::KeepProfile)
                            .await
                        {
                            debug!(kind = ?err.kind, "session ended during refresh");
                        }
                    }
                },
                None => {
                    if let Err(err) = self.reconcile(&identity, None, OnFailure::Degrade).await {
                        debug!(kind = ?err.kind, "session ended during refresh");
                    }
                }
            }

            self.context.snapshot().profile
        }
        .instrument(span)
        .await
    }

    /// Explicit profile save. Unlike reconcile, failures are returned.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Profile, SessionError> {
        let span = info_span!("usecase.session.update_profile");
        async {
            let _guard = self.context.acquire_op_lock().await;
            let snapshot = self.context.snapshot();
            let identity = snapshot.identity.ok_or(SessionError::NotSignedIn)?;
            let profile = snapshot.profile.ok_or(SessionError::ProfileUnavailable)?;

            if patch.is_empty() {
                return Ok(profile);
            }

            let token = self.identity.mint_token(&identity).await?;
            self.persist_token(&token).await;
            self.bounded(self.backend.patch(&profile.id, &patch, &token))
                .await?;
            let fresh = self
                .bounded(self.backend.fetch_by_id(&profile.id, &token))
                .await?;

            self.publish_profile(fresh.clone());
            Ok(fresh)
        }
        .instrument(span)
        .await
    }

    /// Run a profile-dependent backend read with a fresh token.
    ///
    /// `401` means the profile is not provisioned yet and is returned as
    /// [`ProfileRead::NotProvisioned`]; other failures are errors.
    pub async fn authorized_read<T, F, Fut>(&self, read: F) -> Result<ProfileRead<T>, SessionError>
    where
        F: FnOnce(Arc<dyn ProfileBackendPort>, BearerToken) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let token = self.bearer_token().await?;
        let result = self.bounded(read(self.backend.clone(), token)).await;
        Ok(ProfileRead::from_result(result)?)
    }

    /// Token for an authenticated call.
    ///
    /// Minted from the live identity when there is one. Before the identity
    /// provider has restored its session, the cached token is used instead.
    pub async fn bearer_token(&self) -> Result<BearerToken, SessionError> {
        let snapshot = self.context.snapshot();
        if let Some(identity) = snapshot.identity {
            return Ok(self.identity.mint_token(&identity).await?);
        }

        if snapshot.state == SessionState::Initializing {
            if let Some(cached) = self.store.get_token().await?.filter(|t| !t.is_empty()) {
                return Ok(BearerToken::new(cached));
            }
        }

        Err(SessionError::NotSignedIn)
    }

    async fn on_identity_changed(&self, change: IdentitySnapshot) {
        let span = info_span!("usecase.session.identity_changed");
        async {
            let _guard = self.context.acquire_op_lock().await;
            let current = self.context.snapshot();

            match change {
                IdentitySnapshot::Unknown => {}
                IdentitySnapshot::SignedOut => {
                    if current.state == SessionState::Initializing {
                        self.context.apply(SessionEvent::IdentityMissing);
                    } else if current.identity.is_some() {
                        info!("identity provider signed out");
                        self.context.update(Some(SessionEvent::SignedOut), |snapshot| {
                            snapshot.identity = None;
                            snapshot.profile = None;
                        });
                    }
                }
                IdentitySnapshot::SignedIn(identity) => {
                    let superseded = self
                        .identity
                        .subscribe()
                        .borrow()
                        .identity()
                        .map(|latest| latest.id != identity.id)
                        .unwrap_or(true);
                    if superseded {
                        debug!("identity change superseded before it was handled");
                        return;
                    }

                    let already_adopted = current.state.presence() == SessionPresence::Present
                        && current.identity.as_ref().map(|i| &i.id) == Some(&identity.id);
                    if already_adopted {
                        self.context.update(None, |snapshot| {
                            snapshot.identity = Some(identity);
                        });
                        return;
                    }

                    self.adopt(identity.clone());
                    if let Err(err) = self.reconcile(&identity, None, OnFailure::Degrade).await {
                        debug!(kind = ?err.kind, "restored identity rejected");
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Persist the welcome for crash recovery, then tell the resolver directly.
    async fn announce_welcome(&self, welcome: PendingWelcome) {
        if let Err(err) = self.store.set_pending_welcome(&welcome).await {
            warn!(error = %err, "failed to persist pending welcome");
        }
        if let Some(notifier) = &self.welcome {
            notifier.notify(welcome);
        }
    }

    fn adopt(&self, identity: Identity) {
        self.context
            .update(Some(SessionEvent::IdentityAcquired), |snapshot| {
                if snapshot.identity.as_ref().map(|i| &i.id) != Some(&identity.id) {
                    snapshot.profile = None;
                }
                snapshot.identity = Some(identity);
            });
    }

    /// Returns `Err` only when the provider rejected the identity; the
    /// session has been signed out by then.
    async fn reconcile(
        &self,
        identity: &Identity,
        hints: Option<&NameHints>,
        on_failure: OnFailure,
    ) -> Result<(), IdentityError> {
        let token = match self.identity.mint_token(identity).await {
            Ok(token) => token,
            Err(err) if err.kind.is_transient() => {
                warn!(error = %err, "could not mint token for reconcile");
                self.settle_failure(on_failure);
                return Ok(());
            }
            Err(err) => {
                self.end_rejected_session(&err).await;
                return Err(err);
            }
        };
        self.persist_token(&token).await;

        let verified = match self.bounded(self.backend.verify(&token)).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "backend verify failed, session degraded");
                self.settle_failure(on_failure);
                return Ok(());
            }
        };

        let patch = hints
            .map(|hints| hints.corrective_patch(&verified))
            .filter(|patch| !patch.is_empty());
        let profile = match patch {
            None => verified,
            Some(patch) => self.apply_corrective_patch(verified, &patch, &token).await,
        };

        self.publish_profile(profile);
        Ok(())
    }

    /// The identity can no longer mint tokens: drop it like a logout, along
    /// with any welcome announced for it.
    async fn end_rejected_session(&self, err: &IdentityError) {
        warn!(kind = ?err.kind, error = %err, "identity rejected by provider, signing out");

        if let Err(err) = self.identity.sign_out().await {
            warn!(error = %err, "provider sign-out failed");
        }
        if let Err(err) = self.store.clear_token().await {
            warn!(error = %err, "failed to clear cached token");
        }
        if let Err(err) = self.store.clear_pending_welcome().await {
            warn!(error = %err, "failed to clear pending welcome");
        }
        if let Some(notifier) = &self.welcome {
            notifier.withdraw();
        }

        self.context.update(Some(SessionEvent::SignedOut), |snapshot| {
            snapshot.identity = None;
            snapshot.profile = None;
        });
    }

    async fn apply_corrective_patch(
        &self,
        verified: Profile,
        patch: &ProfilePatch,
        token: &BearerToken,
    ) -> Profile {
        debug!(profile_id = %verified.id, "applying corrective name patch");
        if let Err(err) = self
            .bounded(self.backend.patch(&verified.id, patch, token))
            .await
        {
            warn!(error = %err, "corrective patch failed");
            return verified;
        }

        match self
            .bounded(self.backend.fetch_by_id(&verified.id, token))
            .await
        {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!(error = %err, "re-fetch after patch failed, using local merge");
                verified.with_patch(patch)
            }
        }
    }

    async fn fetch_fresh(&self, identity: &Identity, profile: &Profile) -> Result<Profile, SessionError> {
        let token = self.identity.mint_token(identity).await?;
        self.persist_token(&token).await;
        Ok(self
            .bounded(self.backend.fetch_by_id(&profile.id, &token))
            .await?)
    }

    fn publish_profile(&self, profile: Profile) {
        self.context
            .update(Some(SessionEvent::ProfileReconciled), |snapshot| {
                snapshot.profile = Some(profile);
            });
    }

    fn settle_failure(&self, on_failure: OnFailure) {
        if on_failure == OnFailure::Degrade {
            self.context
                .update(Some(SessionEvent::BackendUnavailable), |snapshot| {
                    if snapshot.state == SessionState::Reconciling {
                        snapshot.profile = None;
                    }
                });
        }
    }

    async fn persist_token(&self, token: &BearerToken) {
        if let Err(err) = self.store.set_token(token.as_str()).await {
            warn!(error = %err, "failed to persist bearer token");
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        tokio::time::timeout(self.config.backend_timeout, call)
            .await
            .unwrap_or_else(|_| Err(BackendError::Timeout))
    }
}

async fn follow_identity(controller: Weak<SessionController>, mut rx: watch::Receiver<IdentitySnapshot>) {
    loop {
        let change = rx.borrow_and_update().clone();
        let Some(controller) = controller.upgrade() else {
            break;
        };
        controller.on_identity_changed(change).await;
        drop(controller);

        if rx.changed().await.is_err() {
            debug!("identity stream closed");
            break;
        }
    }
}
