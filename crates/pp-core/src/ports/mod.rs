//! Port interfaces for the application layer
//!
//! Ports define the contract between the session orchestration (use cases)
//! and infrastructure implementations. This follows Hexagonal Architecture
//! principles, allowing the session logic to remain independent of the
//! identity provider SDK, the HTTP stack and the storage medium.
//!
//! ## Port Placement Guidelines
//!
//! A port belongs here when it represents a capability the session core needs
//! from the outside world and is implemented by `pp-infra` (or a test double).

pub mod identity_client;
pub mod key_value_store;
pub mod profile_backend;
pub mod provider_auth_flow;
pub mod session_store;

pub use identity_client::IdentityClientPort;
pub use key_value_store::KeyValueStorePort;
pub use profile_backend::ProfileBackendPort;
pub use provider_auth_flow::ProviderAuthFlowPort;
pub use session_store::SessionStorePort;
