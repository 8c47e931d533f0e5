//! Direct welcome signal from the sign-in paths to the navigation resolver.
//!
//! Storage keeps a copy of the pending welcome for crash recovery only; the
//! resolver learns about a fresh welcome through this channel, before the new
//! session is published. A sign-in that fails after announcing its welcome
//! withdraws it on the same channel.

use pp_core::PendingWelcome;
use tokio::sync::mpsc;
use tracing::debug;

/// Message carried from the session controller to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeSignal {
    Announced(PendingWelcome),
    /// The session the last announcement belonged to never came up.
    Withdrawn,
}

/// Create a connected notifier/inbox pair.
pub fn welcome_channel() -> (WelcomeNotifier, WelcomeInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WelcomeNotifier { tx }, WelcomeInbox { rx })
}

#[derive(Debug, Clone)]
pub struct WelcomeNotifier {
    tx: mpsc::UnboundedSender<WelcomeSignal>,
}

impl WelcomeNotifier {
    pub fn notify(&self, welcome: PendingWelcome) {
        self.send(WelcomeSignal::Announced(welcome));
    }

    pub fn withdraw(&self) {
        self.send(WelcomeSignal::Withdrawn);
    }

    fn send(&self, signal: WelcomeSignal) {
        if self.tx.send(signal).is_err() {
            debug!("navigation resolver is gone, welcome signal dropped");
        }
    }
}

#[derive(Debug)]
pub struct WelcomeInbox {
    rx: mpsc::UnboundedReceiver<WelcomeSignal>,
}

impl WelcomeInbox {
    /// `None` once every notifier has been dropped.
    pub async fn recv(&mut self) -> Option<WelcomeSignal> {
        self.rx.recv().await
    }

    /// Latest already-delivered signal, if any.
    pub fn drain_latest(&mut self) -> Option<WelcomeSignal> {
        let mut latest = None;
        while let Ok(signal) = self.rx.try_recv() {
            latest = Some(signal);
        }
        latest
    }
}
