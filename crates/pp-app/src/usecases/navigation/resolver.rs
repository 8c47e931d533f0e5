//! Navigation state resolver.
//!
//! Re-runs the pure route resolution whenever one of its inputs changes:
//! the onboarding flag, the session presence, or the pending welcome. The
//! result is published as a [`NavigationState`] whose stack key changes
//! whenever the stack shape does, so the UI root remounts instead of
//! patching a stack with a different screen set.
//!
//! The resolver is the only reader and clearer of the stored pending
//! welcome. A fresh welcome arrives through the [`WelcomeInbox`]; the stored
//! copy is only consulted once, at the first resolution after boot.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use pp_core::navigation::{resolve_route, NavigationInputs};
use pp_core::ports::SessionStorePort;
use pp_core::{NavigationState, PendingWelcome, Route, SessionPresence, SessionSnapshot};

use super::welcome::{WelcomeInbox, WelcomeSignal};

/// Inputs pushed to the resolver from outside the session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCommand {
    OnboardingCompleted,
    DismissWelcome,
}

/// Cheap handle for flows that need to inform the resolver.
#[derive(Debug, Clone)]
pub struct NavigationHandle {
    commands: mpsc::UnboundedSender<NavigationCommand>,
    state_rx: watch::Receiver<Option<NavigationState>>,
}

impl NavigationHandle {
    pub fn onboarding_completed(&self) {
        self.send(NavigationCommand::OnboardingCompleted);
    }

    /// The welcome screen was completed or skipped.
    pub fn dismiss_welcome(&self) {
        self.send(NavigationCommand::DismissWelcome);
    }

    /// `None` until the first route is resolved.
    pub fn subscribe(&self) -> watch::Receiver<Option<NavigationState>> {
        self.state_rx.clone()
    }

    pub fn current(&self) -> Option<NavigationState> {
        self.state_rx.borrow().clone()
    }

    fn send(&self, command: NavigationCommand) {
        if self.commands.send(command).is_err() {
            debug!(?command, "navigation resolver stopped, command dropped");
        }
    }
}

struct Pending {
    inbox: WelcomeInbox,
    commands: mpsc::UnboundedReceiver<NavigationCommand>,
}

pub struct NavigationStateResolver {
    store: Arc<dyn SessionStorePort>,
    session_rx: watch::Receiver<SessionSnapshot>,
    handle: NavigationHandle,
    state_tx: watch::Sender<Option<NavigationState>>,
    pending: Mutex<Option<Pending>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NavigationStateResolver {
    pub fn new(
        store: Arc<dyn SessionStorePort>,
        session_rx: watch::Receiver<SessionSnapshot>,
        inbox: WelcomeInbox,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(None);

        Self {
            store,
            session_rx,
            handle: NavigationHandle {
                commands: commands_tx,
                state_rx,
            },
            state_tx,
            pending: Mutex::new(Some(Pending {
                inbox,
                commands: commands_rx,
            })),
            task: Mutex::new(None),
        }
    }

    /// Read the onboarding flag and start resolving. Calling it again is a no-op.
    pub async fn start(&self) {
        let Some(pending) = self.pending.lock().await.take() else {
            debug!("navigation resolver already started");
            return;
        };

        let onboarding_completed = match self.store.get_onboarding_completed().await {
            Ok(flag) => flag,
            Err(err) => {
                warn!(error = %err, "failed to read onboarding flag, treating as not completed");
                None
            }
        };

        let resolver = ResolverLoop {
            store: self.store.clone(),
            session_rx: self.session_rx.clone(),
            inbox: Some(pending.inbox),
            commands: pending.commands,
            state_tx: self.state_tx.clone(),
            onboarding_completed,
            welcome: None,
            last_presence: SessionPresence::Unresolved,
            boot_checked: false,
        };

        let span = info_span!("usecase.navigation.resolver");
        *self.task.lock().await = Some(tokio::spawn(resolver.run().instrument(span)));
        info!(?onboarding_completed, "navigation resolver started");
    }

    pub async fn dispose(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            info!("navigation resolver disposed");
        }
    }

    pub fn handle(&self) -> NavigationHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NavigationState>> {
        self.handle.subscribe()
    }

    pub fn current(&self) -> Option<NavigationState> {
        self.handle.current()
    }

    pub fn dismiss_welcome(&self) {
        self.handle.dismiss_welcome();
    }
}

struct HeldWelcome {
    welcome: PendingWelcome,
    /// Whether the stored crash-recovery copy has been cleared already.
    storage_cleared: bool,
}

impl HeldWelcome {
    fn new(welcome: PendingWelcome) -> Self {
        Self {
            welcome,
            storage_cleared: false,
        }
    }
}

struct ResolverLoop {
    store: Arc<dyn SessionStorePort>,
    session_rx: watch::Receiver<SessionSnapshot>,
    inbox: Option<WelcomeInbox>,
    commands: mpsc::UnboundedReceiver<NavigationCommand>,
    state_tx: watch::Sender<Option<NavigationState>>,
    onboarding_completed: Option<bool>,
    welcome: Option<HeldWelcome>,
    last_presence: SessionPresence,
    boot_checked: bool,
}

impl ResolverLoop {
    async fn run(mut self) {
        self.evaluate().await;

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(NavigationCommand::OnboardingCompleted) => {
                        self.onboarding_completed = Some(true);
                    }
                    Some(NavigationCommand::DismissWelcome) => {
                        if let Some(held) = self.welcome.take() {
                            debug!(is_new_user = held.welcome.is_new_user, "welcome dismissed");
                            self.clear_stored_welcome(held).await;
                        }
                    }
                    None => break,
                },
                signal = next_welcome(&mut self.inbox) => match signal {
                    Some(signal) => self.receive(signal).await,
                    None => self.inbox = None,
                },
                changed = self.session_rx.changed() => {
                    if changed.is_err() {
                        debug!("session stream closed");
                        break;
                    }
                }
            }

            self.evaluate().await;
        }
    }

    async fn evaluate(&mut self) {
        // A welcome is announced before the session it belongs to is
        // published; take it now so the route never flashes Main first.
        if let Some(signal) = self.inbox.as_mut().and_then(WelcomeInbox::drain_latest) {
            self.receive(signal).await;
        }

        let presence = self.session_rx.borrow_and_update().state.presence();

        if !self.boot_checked && presence != SessionPresence::Unresolved {
            self.boot_checked = true;
            self.check_stored_welcome(presence).await;
        }

        if presence == SessionPresence::Absent && self.last_presence == SessionPresence::Present {
            if let Some(held) = self.welcome.take() {
                debug!("session ended, dropping pending welcome");
                self.clear_stored_welcome(held).await;
            }
        }
        self.last_presence = presence;

        let inputs = NavigationInputs {
            onboarding_completed: self.onboarding_completed,
            session: presence,
            pending_welcome: self.welcome.as_ref().map(|held| held.welcome.clone()),
        };
        let Some(route) = resolve_route(&inputs) else {
            return;
        };

        self.state_tx.send_if_modified(|current| {
            let next = NavigationState::advance(current.as_ref(), route.clone());
            if current.as_ref() == Some(&next) {
                return false;
            }
            info!(route = ?next.route, key = ?next.key, "navigation route resolved");
            *current = Some(next);
            true
        });

        if matches!(route, Route::Welcome(_)) {
            if let Some(held) = self.welcome.as_mut().filter(|held| !held.storage_cleared) {
                held.storage_cleared = true;
                if let Err(err) = self.store.clear_pending_welcome().await {
                    warn!(error = %err, "failed to clear pending welcome");
                }
            }
        }
    }

    async fn receive(&mut self, signal: WelcomeSignal) {
        match signal {
            WelcomeSignal::Announced(welcome) => self.welcome = Some(HeldWelcome::new(welcome)),
            WelcomeSignal::Withdrawn => {
                debug!("pending welcome withdrawn");
                self.welcome = None;
                if let Err(err) = self.store.clear_pending_welcome().await {
                    warn!(error = %err, "failed to clear pending welcome");
                }
            }
        }
    }

    /// First resolution after boot: honour a stored welcome only for a
    /// session that is present right away, otherwise discard it.
    async fn check_stored_welcome(&mut self, presence: SessionPresence) {
        if self.welcome.is_some() {
            return;
        }

        let stored = match self.store.get_pending_welcome().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "unreadable pending welcome, discarding");
                if let Err(err) = self.store.clear_pending_welcome().await {
                    warn!(error = %err, "failed to clear pending welcome");
                }
                return;
            }
        };

        let Some(welcome) = stored else {
            return;
        };

        if presence == SessionPresence::Present {
            info!(is_new_user = welcome.is_new_user, "restoring pending welcome");
            self.welcome = Some(HeldWelcome::new(welcome));
        } else {
            debug!("discarding pending welcome without a session");
            if let Err(err) = self.store.clear_pending_welcome().await {
                warn!(error = %err, "failed to clear pending welcome");
            }
        }
    }

    async fn clear_stored_welcome(&self, held: HeldWelcome) {
        if held.storage_cleared {
            return;
        }
        if let Err(err) = self.store.clear_pending_welcome().await {
            warn!(error = %err, "failed to clear pending welcome");
        }
    }
}

async fn next_welcome(inbox: &mut Option<WelcomeInbox>) -> Option<WelcomeSignal> {
    match inbox {
        Some(inbox) => inbox.recv().await,
        None => std::future::pending().await,
    }
}
