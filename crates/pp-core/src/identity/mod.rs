//! Identity provider domain models.
//!
//! An [`Identity`] is the principal authenticated by the third-party provider.
//! The session core holds it by value but never mutates it; bearer tokens are
//! minted from it on demand through `IdentityClientPort::mint_token`.

use serde::{Deserialize, Serialize};

use crate::ids::IdentityId;

/// Provider-authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<IdentityId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// What the identity provider currently knows about the signed-in principal.
///
/// 身份提供方当前的登录快照。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentitySnapshot {
    /// The provider has not restored its persisted session yet.
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Identity),
}

impl IdentitySnapshot {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            IdentitySnapshot::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Short-lived bearer token minted from a live identity.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BearerToken(len={})", self.0.len())
    }
}

/// Credential produced by a provider-hosted sign-in flow (e.g. Google).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub provider_id: String,
    pub id_token: String,
}

/// Successful provider-delegated sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSignIn {
    pub identity: Identity,
    pub is_new_user: bool,
}
