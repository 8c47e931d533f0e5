use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::info;

use pp_core::{SessionEvent, SessionSnapshot, SessionState, SessionStateMachine};

/// Shared session context containing the observable snapshot and the op lock.
///
/// ## Lock Ordering
/// - `op_lock`: held for the whole of a state-changing operation (commands and
///   identity callbacks), so transitions, side effects and the snapshot
///   update run atomically with respect to each other.
/// - The snapshot itself lives in a `watch` channel and is read without
///   taking `op_lock`.
pub struct SessionContext {
    snapshot_tx: watch::Sender<SessionSnapshot>,
    op_lock: Mutex<()>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            snapshot_tx,
            op_lock: Mutex::new(()),
        }
    }

    pub async fn acquire_op_lock(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot_tx.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Apply `event` and optionally edit the rest of the snapshot in the same
    /// publication. Receivers never observe the two halves separately.
    pub fn update<F>(&self, event: Option<SessionEvent>, edit: F) -> SessionState
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let mut next_state = SessionState::default();
        self.snapshot_tx.send_modify(|snapshot| {
            edit(snapshot);
            if let Some(event) = event {
                let from = snapshot.state;
                snapshot.state = SessionStateMachine::transition(from, event);
                if from != snapshot.state {
                    info!(from = ?from, to = ?snapshot.state, event = ?event, "session state transition");
                }
            }
            next_state = snapshot.state;
        });
        next_state
    }

    pub fn apply(&self, event: SessionEvent) -> SessionState {
        self.update(Some(event), |_| {})
    }
}
