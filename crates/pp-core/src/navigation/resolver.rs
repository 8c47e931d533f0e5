//! Pure navigation route resolution.

use super::{PendingWelcome, Route, SessionPresence};

/// The three inputs the route depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationInputs {
    /// `None` when the flag has never been written.
    pub onboarding_completed: Option<bool>,
    pub session: SessionPresence,
    pub pending_welcome: Option<PendingWelcome>,
}

/// Resolve the top-level route in strict priority order:
/// onboarding, then session presence, then pending welcome.
///
/// Returns `None` only while onboarding is done but the session has not
/// settled yet; the caller keeps its splash until then.
pub fn resolve_route(inputs: &NavigationInputs) -> Option<Route> {
    if inputs.onboarding_completed != Some(true) {
        return Some(Route::Onboarding);
    }

    match inputs.session {
        SessionPresence::Unresolved => None,
        SessionPresence::Absent => Some(Route::Auth),
        SessionPresence::Present => match &inputs.pending_welcome {
            Some(welcome) => Some(Route::Welcome(welcome.clone())),
            None => Some(Route::Main),
        },
    }
}
