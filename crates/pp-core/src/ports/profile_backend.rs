//! Backend profile port
//!
//! Authenticated calls against the backend-owned profile record. All three
//! operations are idempotent: `verify` with the same token never creates a
//! second profile, and repeating a `patch` with the same fields is a no-op.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::identity::BearerToken;
use crate::ids::ProfileId;
use crate::profile::{Profile, ProfilePatch};

#[async_trait]
pub trait ProfileBackendPort: Send + Sync {
    /// `POST /auth/verify` - fetch or create the profile bound to the token's identity.
    async fn verify(&self, token: &BearerToken) -> Result<Profile, BackendError>;

    /// `PUT /users/{id}`
    async fn patch(
        &self,
        id: &ProfileId,
        patch: &ProfilePatch,
        token: &BearerToken,
    ) -> Result<(), BackendError>;

    /// `GET /users/{id}`
    async fn fetch_by_id(&self, id: &ProfileId, token: &BearerToken)
        -> Result<Profile, BackendError>;
}
