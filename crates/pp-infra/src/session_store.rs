//! Session keys over a key-value store
//!
//! | key                     | value                                   |
//! |-------------------------|-----------------------------------------|
//! | `authToken`             | last bearer token, string               |
//! | `onboarding_completed`  | `"true"` or absent                      |
//! | `showWelcomeScreen`     | JSON `{"isNewUser": bool, "userName"?}` |

use std::sync::Arc;

use async_trait::async_trait;
use pp_core::ports::{KeyValueStorePort, SessionStorePort};
use pp_core::{PendingWelcome, StorageError};

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding_completed";
pub const PENDING_WELCOME_KEY: &str = "showWelcomeScreen";

pub struct KvSessionStore {
    kv: Arc<dyn KeyValueStorePort>,
}

impl KvSessionStore {
    pub fn new(kv: Arc<dyn KeyValueStorePort>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl SessionStorePort for KvSessionStore {
    async fn get_token(&self) -> Result<Option<String>, StorageError> {
        self.kv.get(AUTH_TOKEN_KEY).await
    }

    async fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.kv.set(AUTH_TOKEN_KEY, token).await
    }

    async fn clear_token(&self) -> Result<(), StorageError> {
        self.kv.remove(AUTH_TOKEN_KEY).await
    }

    async fn get_onboarding_completed(&self) -> Result<Option<bool>, StorageError> {
        Ok(self
            .kv
            .get(ONBOARDING_COMPLETED_KEY)
            .await?
            .map(|value| value == "true"))
    }

    async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError> {
        if completed {
            self.kv.set(ONBOARDING_COMPLETED_KEY, "true").await
        } else {
            self.kv.remove(ONBOARDING_COMPLETED_KEY).await
        }
    }

    async fn get_pending_welcome(&self) -> Result<Option<PendingWelcome>, StorageError> {
        let Some(raw) = self.kv.get(PENDING_WELCOME_KEY).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: PENDING_WELCOME_KEY.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set_pending_welcome(&self, welcome: &PendingWelcome) -> Result<(), StorageError> {
        let raw = serde_json::to_string(welcome)
            .map_err(|e| StorageError::Write(format!("serialize pending welcome: {e}")))?;
        self.kv.set(PENDING_WELCOME_KEY, &raw).await
    }

    async fn clear_pending_welcome(&self) -> Result<(), StorageError> {
        self.kv.remove(PENDING_WELCOME_KEY).await
    }
}
