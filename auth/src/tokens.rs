use std::fmt;
use std::time::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Request field name under which this token travels.
    pub fn param(&self) -> &'static str {
        match self {
            TokenKind::Access => "token",
            TokenKind::Refresh => "refreshToken",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access token"),
            TokenKind::Refresh => f.write_str("refresh token"),
        }
    }
}

/// Signing settings for one token family.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub expires_in_secs: i64,
}

/// An access/refresh token pair minted together for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Access and refresh token codec.
///
/// Each family has its own secret and lifetime, so a refresh token never
/// verifies as an access token and vice versa.
pub struct TokenCodec {
    access: JwtHandler,
    refresh: JwtHandler,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec from the access and refresh settings.
    ///
    /// # Errors
    /// * `InvalidLifetime` - A lifetime is not within `1..=MAX_TOKEN_TTL_SECS`
    pub fn new(access: &TokenSettings, refresh: &TokenSettings) -> Result<Self, JwtError> {
        Ok(Self {
            access: JwtHandler::new(access.secret.as_bytes()),
            refresh: JwtHandler::new(refresh.secret.as_bytes()),
            access_ttl_secs: checked_ttl(access.expires_in_secs)?,
            refresh_ttl_secs: checked_ttl(refresh.expires_in_secs)?,
        })
    }

    /// Sign claims with the access secret.
    pub fn sign_access(&self, claims: &Claims) -> Result<String, JwtError> {
        self.access.encode(claims)
    }

    /// Sign claims with the refresh secret.
    pub fn sign_refresh(&self, claims: &Claims) -> Result<String, JwtError> {
        self.refresh.encode(claims)
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiration
    /// * `InvalidToken` - Any other structural or signature failure
    pub fn verify_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.access.decode(token)
    }

    /// Verify a refresh token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiration
    /// * `InvalidToken` - Any other structural or signature failure
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.refresh.decode(token)
    }

    /// Verify a token of the given family.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, JwtError> {
        match kind {
            TokenKind::Access => self.verify_access(token),
            TokenKind::Refresh => self.verify_refresh(token),
        }
    }

    /// Mint a fresh access/refresh pair for a subject.
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, JwtError> {
        let access_token =
            self.sign_access(&Claims::for_subject(subject, self.access_ttl_secs))?;
        let refresh_token =
            self.sign_refresh(&Claims::for_subject(subject, self.refresh_ttl_secs))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Lifetime of refresh tokens, which is also how long a pairing stays redeemable.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs.unsigned_abs())
    }
}

fn checked_ttl(secs: i64) -> Result<i64, JwtError> {
    if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(JwtError::InvalidLifetime(secs))
    }
}
