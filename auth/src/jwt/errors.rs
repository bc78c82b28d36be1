use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    /// Signature is valid but the `exp` claim is in the past.
    #[error("Token is expired")]
    TokenExpired { expired_at: Option<i64> },

    /// Malformed token, wrong secret, tampered payload or unexpected shape.
    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    /// Configured lifetime is zero, negative or unreasonably large.
    #[error("Invalid token lifetime: {0} seconds")]
    InvalidLifetime(i64),

    #[error("Missing required claim: {0}")]
    MissingClaim(String),
}
