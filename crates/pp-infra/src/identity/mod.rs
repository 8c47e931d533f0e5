//! Identity provider adapters

pub mod error_codes;
pub mod provider_flow;
pub mod rest_identity_client;

pub use error_codes::map_provider_error;
pub use provider_flow::{DisabledProviderAuthFlow, StaticProviderAuthFlow};
pub use rest_identity_client::{
    RestIdentityClient, DEFAULT_AUTH_BASE_URL, DEFAULT_TOKEN_BASE_URL, IDENTITY_SESSION_KEY,
};
