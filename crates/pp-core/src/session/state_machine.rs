//! Session state machine.
//!
//! Defines a pure state transition function for the session lifecycle.
//! Side effects (identity calls, backend calls, storage) live in the
//! application layer; this module only decides where a state goes next.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::navigation::SessionPresence;

/// Session lifecycle state.
///
/// 会话生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for the identity provider to restore its session.
    ///
    /// 等待身份提供方恢复会话。
    #[default]
    Initializing,
    /// No identity.
    ///
    /// 未登录。
    Unauthenticated,
    /// A credential sign-in or sign-up call is in flight.
    ///
    /// 正在进行凭据登录或注册。
    Authenticating,
    /// Identity known, backend profile being reconciled.
    ///
    /// 身份已知，正在与后端同步用户资料。
    Reconciling,
    /// Identity and profile both known.
    ///
    /// 身份与资料均已就绪。
    Ready,
    /// Identity known but the backend could not be reached.
    ///
    /// 身份已知但后端不可达。
    Degraded,
}

impl SessionState {
    /// How the navigation layer sees this state.
    pub fn presence(&self) -> SessionPresence {
        match self {
            SessionState::Initializing => SessionPresence::Unresolved,
            SessionState::Unauthenticated | SessionState::Authenticating => {
                SessionPresence::Absent
            }
            SessionState::Reconciling | SessionState::Ready | SessionState::Degraded => {
                SessionPresence::Present
            }
        }
    }
}

/// Events that drive the session lifecycle.
///
/// 驱动会话生命周期的事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The identity stream reports no signed-in principal.
    IdentityMissing,
    /// An explicit credential sign-in/sign-up started.
    CredentialsSubmitted,
    /// The explicit credential call failed.
    AuthAborted,
    /// A live identity was adopted (command result or identity stream).
    IdentityAcquired,
    /// Backend profile reconciled successfully.
    ProfileReconciled,
    /// Backend unreachable (network failure, timeout, server error).
    BackendUnavailable,
    /// Explicit logout.
    SignedOut,
}

/// Pure session state machine.
///
/// 纯状态机：不包含副作用。
pub struct SessionStateMachine;

impl SessionStateMachine {
    pub fn transition(state: SessionState, event: SessionEvent) -> SessionState {
        use SessionEvent as E;
        use SessionState as S;

        match (state, event) {
            (S::Initializing, E::IdentityMissing) => S::Unauthenticated,
            // A credential call owns the session until it settles.
            (S::Authenticating, E::IdentityMissing) => S::Authenticating,
            (_, E::IdentityMissing) => S::Unauthenticated,

            (S::Unauthenticated, E::CredentialsSubmitted) => S::Authenticating,
            (S::Authenticating, E::AuthAborted) => S::Unauthenticated,

            (_, E::IdentityAcquired) => S::Reconciling,

            (S::Reconciling | S::Ready | S::Degraded, E::ProfileReconciled) => S::Ready,
            (S::Reconciling, E::BackendUnavailable) => S::Degraded,

            (_, E::SignedOut) => S::Unauthenticated,

            (state, event) => {
                debug!(?state, ?event, "session event ignored");
                state
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionEvent, SessionState, SessionStateMachine};
    use crate::navigation::SessionPresence;

    #[test]
    fn session_state_machine_initializing_without_identity_becomes_unauthenticated() {
        let next = SessionStateMachine::transition(
            SessionState::Initializing,
            SessionEvent::IdentityMissing,
        );
        assert_eq!(next, SessionState::Unauthenticated);
    }

    #[test]
    fn session_state_machine_login_path_reaches_ready() {
        let mut state = SessionState::Unauthenticated;
        for event in [
            SessionEvent::CredentialsSubmitted,
            SessionEvent::IdentityAcquired,
            SessionEvent::ProfileReconciled,
        ] {
            state = SessionStateMachine::transition(state, event);
        }
        assert_eq!(state, SessionState::Ready);
    }

    #[test]
    fn session_state_machine_backend_down_degrades() {
        let next =
            SessionStateMachine::transition(SessionState::Reconciling, SessionEvent::BackendUnavailable);
        assert_eq!(next, SessionState::Degraded);
    }

    #[test]
    fn session_state_machine_backend_down_keeps_ready_session() {
        let next =
            SessionStateMachine::transition(SessionState::Ready, SessionEvent::BackendUnavailable);
        assert_eq!(next, SessionState::Ready);
    }

    #[test]
    fn session_state_machine_failed_credentials_return_to_unauthenticated() {
        let next =
            SessionStateMachine::transition(SessionState::Authenticating, SessionEvent::AuthAborted);
        assert_eq!(next, SessionState::Unauthenticated);
    }

    #[test]
    fn session_state_machine_identity_stream_does_not_interrupt_credential_call() {
        let next = SessionStateMachine::transition(
            SessionState::Authenticating,
            SessionEvent::IdentityMissing,
        );
        assert_eq!(next, SessionState::Authenticating);
    }

    #[test]
    fn session_state_machine_sign_out_from_any_state() {
        for state in [
            SessionState::Initializing,
            SessionState::Unauthenticated,
            SessionState::Authenticating,
            SessionState::Reconciling,
            SessionState::Ready,
            SessionState::Degraded,
        ] {
            assert_eq!(
                SessionStateMachine::transition(state, SessionEvent::SignedOut),
                SessionState::Unauthenticated
            );
        }
    }

    #[test]
    fn session_state_machine_degraded_recovers_on_reconcile() {
        let next =
            SessionStateMachine::transition(SessionState::Degraded, SessionEvent::ProfileReconciled);
        assert_eq!(next, SessionState::Ready);
    }

    #[test]
    fn presence_maps_states_to_navigation_view() {
        assert_eq!(SessionState::Initializing.presence(), SessionPresence::Unresolved);
        assert_eq!(SessionState::Authenticating.presence(), SessionPresence::Absent);
        assert_eq!(SessionState::Degraded.presence(), SessionPresence::Present);
    }
}
