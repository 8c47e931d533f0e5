//! Business logic use cases
//!
//! IdentityClient events
//!         ↓
//! SessionController ⇄ ProfileBackend (reconcile)
//!         ↓
//! SessionSnapshot (watch) ──→ NavigationStateResolver ──→ NavigationState (watch)
//!                                      ↑
//!                     WelcomeNotifier / CompleteOnboarding

pub mod navigation;
pub mod onboarding;
pub mod session;
