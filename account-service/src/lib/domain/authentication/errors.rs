use auth::JwtError;
use auth::PasswordError;
use auth::TokenKind;
use thiserror::Error;

use crate::user::errors::UserError;

/// Error for login, authorization and refresh operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Inactive account")]
    InactiveAccount,

    #[error("Blocked account")]
    BlockedAccount,

    #[error("Unverified email")]
    UnverifiedEmail,

    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    #[error("Restrict access")]
    AccessRestricted,

    /// Signature is valid but the token is past its expiration.
    #[error("{kind} expired")]
    TokenExpired {
        kind: TokenKind,
        expired_at: Option<i64>,
    },

    #[error("Invalid {0}")]
    TokenInvalid(TokenKind),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Classify a verification failure for a token of the given family.
    pub fn from_jwt(kind: TokenKind, err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired { expired_at } => AuthError::TokenExpired { kind, expired_at },
            JwtError::EncodingFailed(msg) => AuthError::Signing(msg),
            JwtError::InvalidToken(_) | JwtError::MissingClaim(_) => AuthError::TokenInvalid(kind),
            JwtError::InvalidLifetime(secs) => {
                AuthError::Internal(format!("Invalid {} lifetime: {}s", kind, secs))
            }
        }
    }
}
