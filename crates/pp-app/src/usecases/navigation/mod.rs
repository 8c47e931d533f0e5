//! Navigation resolution use cases.

pub mod resolver;
pub mod welcome;

pub use resolver::{NavigationCommand, NavigationHandle, NavigationStateResolver};
pub use welcome::{welcome_channel, WelcomeInbox, WelcomeNotifier, WelcomeSignal};
