//! Navigation domain module.
//!
//! Maps onboarding completion, session presence and a pending welcome onto
//! exactly one top-level route, and describes the screen stack the UI root
//! should mount for it.

pub mod resolver;

pub use resolver::{resolve_route, NavigationInputs};

use serde::{Deserialize, Serialize};

/// One-shot request to greet the user on the first screen after sign-in.
///
/// Stored as `{"isNewUser": bool, "userName": string?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWelcome {
    pub is_new_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl PendingWelcome {
    pub fn new_user(user_name: Option<String>) -> Self {
        Self {
            is_new_user: true,
            user_name,
        }
    }

    pub fn returning_user(user_name: Option<String>) -> Self {
        Self {
            is_new_user: false,
            user_name,
        }
    }
}

/// Whether a session exists, as far as navigation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPresence {
    /// The session controller has not settled its initial state yet.
    Unresolved,
    Absent,
    Present,
}

/// Top-level UI region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Onboarding,
    Auth,
    Welcome(PendingWelcome),
    Main,
}

/// Screens mounted in the root stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Onboarding,
    Auth,
    Main,
    Welcome(PendingWelcome),
}

/// Shape of the root stack. Different kinds have different screen sets and
/// therefore require a full remount when switching between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackKind {
    Onboarding,
    Auth,
    WelcomeOverMain,
    Main,
}

impl StackKind {
    pub fn for_route(route: &Route) -> Self {
        match route {
            Route::Onboarding => StackKind::Onboarding,
            Route::Auth => StackKind::Auth,
            Route::Welcome(_) => StackKind::WelcomeOverMain,
            Route::Main => StackKind::Main,
        }
    }
}

/// Identity key of the mounted navigation tree. A new key forces a remount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackKey {
    pub kind: StackKind,
    pub generation: u64,
}

/// Resolved navigation output consumed by the UI root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub route: Route,
    /// Bottom-to-top screen stack.
    pub stack: Vec<Screen>,
    pub key: StackKey,
}

impl NavigationState {
    /// Build the state for `route`, keeping the previous key when the stack
    /// kind is unchanged and minting a new one otherwise.
    pub fn advance(previous: Option<&NavigationState>, route: Route) -> Self {
        let kind = StackKind::for_route(&route);
        let key = match previous {
            Some(prev) if prev.key.kind == kind => prev.key,
            Some(prev) => StackKey {
                kind,
                generation: prev.key.generation + 1,
            },
            None => StackKey {
                kind,
                generation: 0,
            },
        };

        let stack = match &route {
            Route::Onboarding => vec![Screen::Onboarding],
            Route::Auth => vec![Screen::Auth],
            Route::Welcome(welcome) => vec![Screen::Main, Screen::Welcome(welcome.clone())],
            Route::Main => vec![Screen::Main],
        };

        Self { route, stack, key }
    }
}
