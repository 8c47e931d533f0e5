//! # pp-app
//!
//! Use cases of the PawPoint session core:
//!
//! - [`SessionController`]: the authoritative session state machine and the
//!   reconcile algorithm between identity provider and backend profile
//! - [`NavigationStateResolver`]: reactive route derivation over session
//!   presence, onboarding completion and the pending welcome
//! - [`CompleteOnboarding`]: first-run completion

pub mod usecases;

pub use usecases::navigation::{
    welcome_channel, NavigationHandle, NavigationStateResolver, WelcomeInbox, WelcomeNotifier,
    WelcomeSignal,
};
pub use usecases::onboarding::CompleteOnboarding;
pub use usecases::session::{
    ProviderLogin, SessionConfig, SessionController, SessionError,
};
