//! # pp-infra
//!
//! Infrastructure adapters for the PawPoint session core:
//!
//! - [`kv::FileKeyValueStore`] - durable JSON-file key-value storage
//! - [`session_store::KvSessionStore`] - typed session keys over any key-value store
//! - [`backend::HttpProfileBackend`] - backend profile REST client
//! - [`identity::RestIdentityClient`] - identity provider REST client

pub mod backend;
pub mod identity;
pub mod kv;
pub mod session_store;

pub use backend::HttpProfileBackend;
pub use identity::{DisabledProviderAuthFlow, RestIdentityClient, StaticProviderAuthFlow};
pub use kv::FileKeyValueStore;
pub use session_store::KvSessionStore;
