//! # pp-core
//!
//! Core domain models and ports for the PawPoint session core.
//!
//! This crate contains pure session logic without any infrastructure dependencies:
//! the session state machine, the navigation route resolver, the closed error
//! taxonomy and the port traits implemented by `pp-infra`.

pub mod config;
pub mod error;
pub mod identity;
pub mod ids;
pub mod navigation;
pub mod ports;
pub mod profile;
pub mod session;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use error::{AuthErrorKind, BackendError, IdentityError, ProfileRead, StorageError};
pub use identity::{BearerToken, Identity, IdentitySnapshot, ProviderCredential, ProviderSignIn};
pub use ids::{IdentityId, ProfileId};
pub use navigation::{NavigationState, PendingWelcome, Route, SessionPresence};
pub use profile::{NameHints, Profile, ProfilePatch};
pub use session::{SessionEvent, SessionSnapshot, SessionState, SessionStateMachine};
