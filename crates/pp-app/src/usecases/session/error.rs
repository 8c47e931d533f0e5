use pp_core::{AuthErrorKind, BackendError, IdentityError, StorageError};

/// Errors surfaced by session commands.
///
/// UI code switches on [`SessionError::kind`], never on the message.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("no signed-in session")]
    NotSignedIn,
    #[error("profile is not available while the backend is unreachable")]
    ProfileUnavailable,
}

impl SessionError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            SessionError::Identity(err) => err.kind,
            SessionError::Backend(err) => err.kind(),
            SessionError::ProfileUnavailable => AuthErrorKind::BackendUnreachable,
            SessionError::Storage(_) | SessionError::NotSignedIn => AuthErrorKind::Unknown,
        }
    }
}
