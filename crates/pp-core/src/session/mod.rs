//! Session domain module.
//!
//! This module defines the session lifecycle state machine types and the
//! observable snapshot published by the session controller.

pub mod state_machine;

pub use state_machine::{SessionEvent, SessionState, SessionStateMachine};

use crate::identity::Identity;
use crate::profile::Profile;

/// Observable view of the current session.
///
/// 当前会话的可观察快照。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
}
