//! Provider error code translation.
//!
//! The identity toolkit reports failures as `{"error": {"message": "CODE : detail"}}`.
//! Only the leading code is stable; the detail text is for humans.

use pp_core::{AuthErrorKind, IdentityError};

/// Map a provider error message onto the closed error taxonomy.
pub fn map_provider_error(message: &str) -> IdentityError {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default()
        .trim();

    let kind = match code {
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthErrorKind::UserNotFound,
        "INVALID_PASSWORD"
        | "INVALID_LOGIN_CREDENTIALS"
        | "INVALID_EMAIL"
        | "INVALID_IDP_RESPONSE"
        | "INVALID_REFRESH_TOKEN"
        | "TOKEN_EXPIRED"
        | "MISSING_PASSWORD" => AuthErrorKind::InvalidCredential,
        "WEAK_PASSWORD" => AuthErrorKind::WeakCredential,
        "EMAIL_EXISTS" | "FEDERATED_USER_ID_ALREADY_LINKED" => AuthErrorKind::AlreadyInUse,
        _ => AuthErrorKind::Unknown,
    };

    IdentityError::new(kind, message)
}
