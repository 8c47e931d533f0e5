//! Session store port
//!
//! Typed durable persistence for the cached bearer token, the onboarding flag
//! and the one-shot pending welcome record.
//!
//! Key ownership: the token belongs to the session controller, the onboarding
//! flag to the onboarding flow, and the pending welcome is written by the
//! login/register paths and read/cleared only by the navigation resolver.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::navigation::PendingWelcome;

#[async_trait]
pub trait SessionStorePort: Send + Sync {
    async fn get_token(&self) -> Result<Option<String>, StorageError>;
    async fn set_token(&self, token: &str) -> Result<(), StorageError>;
    async fn clear_token(&self) -> Result<(), StorageError>;

    /// `None` when the flag has never been written.
    async fn get_onboarding_completed(&self) -> Result<Option<bool>, StorageError>;
    async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError>;

    async fn get_pending_welcome(&self) -> Result<Option<PendingWelcome>, StorageError>;
    async fn set_pending_welcome(&self, welcome: &PendingWelcome) -> Result<(), StorageError>;
    async fn clear_pending_welcome(&self) -> Result<(), StorageError>;

    /// Convenience: whether onboarding has definitely been completed.
    async fn is_onboarding_completed(&self) -> Result<bool, StorageError> {
        Ok(self.get_onboarding_completed().await? == Some(true))
    }
}
