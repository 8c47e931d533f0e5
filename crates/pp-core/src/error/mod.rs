//! Closed error taxonomy for the session core.
//!
//! Identity and backend adapters translate their native failures into these
//! types at the port boundary; callers switch on [`AuthErrorKind`], never on
//! message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display category for session failures.
///
/// 会话错误的展示类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorKind {
    InvalidCredential,
    UserNotFound,
    WeakCredential,
    AlreadyInUse,
    NetworkUnavailable,
    BackendUnreachable,
    /// The user dismissed a provider-hosted flow. Not a failure.
    Cancelled,
    Unknown,
}

impl AuthErrorKind {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthErrorKind::Cancelled)
    }

    /// The identity itself is still good; the provider just could not be reached.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthErrorKind::NetworkUnavailable)
    }
}

/// Failure reported by the identity provider boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct IdentityError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl IdentityError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(AuthErrorKind::Cancelled, "sign-in flow cancelled by user")
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::NetworkUnavailable, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Unknown, message)
    }
}

/// Failure reported by the backend profile API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend rejected the bearer token")]
    Unauthorized,

    #[error("backend resource not found")]
    NotFound,

    #[error("backend returned unexpected status {0}")]
    Status(u16),

    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether the failure means "the backend could not be reached right now".
    pub fn is_unavailable(&self) -> bool {
        match self {
            BackendError::Unreachable(_) | BackendError::Timeout => true,
            BackendError::Status(code) => *code >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        if self.is_unavailable() {
            AuthErrorKind::BackendUnreachable
        } else {
            AuthErrorKind::Unknown
        }
    }
}

/// Failure reported by durable key-value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),

    #[error("corrupt value stored under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result of a read that depends on the backend profile being provisioned.
///
/// A `401` on such a read means "the profile does not exist yet", which is a
/// normal state right after sign-up rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRead<T> {
    Value(T),
    NotProvisioned,
}

impl<T> ProfileRead<T> {
    /// Classify a backend read, turning `Unauthorized` into `NotProvisioned`.
    pub fn from_result(result: Result<T, BackendError>) -> Result<Self, BackendError> {
        match result {
            Ok(value) => Ok(ProfileRead::Value(value)),
            Err(BackendError::Unauthorized) => Ok(ProfileRead::NotProvisioned),
            Err(err) => Err(err),
        }
    }

    pub fn is_not_provisioned(&self) -> bool {
        matches!(self, ProfileRead::NotProvisioned)
    }

    pub fn value(self) -> Option<T> {
        match self {
            ProfileRead::Value(value) => Some(value),
            ProfileRead::NotProvisioned => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.value().unwrap_or(default)
    }
}
