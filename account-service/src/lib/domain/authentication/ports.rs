use std::time::Duration;

use async_trait::async_trait;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::models::AuthResult;
use crate::domain::authentication::models::LoginCommand;
use crate::domain::user::models::User;

/// Port for authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Exchange credentials for a user and a new token pair.
    ///
    /// # Errors
    /// * `UserNotFound` - No account with this email
    /// * `PasswordMismatch` - Wrong password, or the account has no local password
    async fn login(&self, command: LoginCommand) -> Result<AuthResult, AuthError>;

    /// Resolve an access token to the user it was issued for.
    ///
    /// Account checks run in a fixed order: inactive, blocked, unverified.
    ///
    /// # Errors
    /// * `TokenExpired` / `TokenInvalid` - Token failed verification
    /// * `UserNotFound` - Subject no longer exists
    /// * `InactiveAccount` / `BlockedAccount` / `UnverifiedEmail` - Account state check failed
    async fn authorize(
        &self,
        access_token: &str,
        require_verified_email: bool,
    ) -> Result<User, AuthError>;

    /// Redeem a cached access/refresh pairing for a brand-new pair.
    ///
    /// # Errors
    /// * `RefreshTokenNotFound` - No pairing for this access token, or a different refresh token
    /// * `TokenExpired` / `TokenInvalid` - Refresh token failed verification
    /// * `UserNotFound` - Subject no longer exists
    async fn refresh(&self, access_token: &str, refresh_token: &str)
        -> Result<AuthResult, AuthError>;

    /// Mint and register a token pair for an already authenticated user.
    async fn issue(&self, user: User) -> Result<AuthResult, AuthError>;
}

/// Storage for access token to refresh token pairings.
///
/// `redeem` must be atomic per key: of two concurrent redemptions of the same
/// pairing at most one returns `true`.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Record a pairing, replacing any previous one for the same access token.
    async fn put(
        &self,
        access_token: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    async fn get(&self, access_token: &str) -> Result<Option<String>, AuthError>;

    async fn remove(&self, access_token: &str) -> Result<(), AuthError>;

    /// Delete the pairing if it holds exactly `refresh_token`.
    async fn redeem(&self, access_token: &str, refresh_token: &str) -> Result<bool, AuthError>;
}
