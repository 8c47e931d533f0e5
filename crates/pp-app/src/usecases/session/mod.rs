//! Session lifecycle use cases.

pub mod config;
pub mod context;
pub mod controller;
pub mod error;

pub use config::SessionConfig;
pub use context::SessionContext;
pub use controller::{ProviderLogin, SessionController};
pub use error::SessionError;
