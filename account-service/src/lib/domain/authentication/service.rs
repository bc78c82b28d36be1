use std::sync::Arc;

use async_trait::async_trait;
use auth::Claims;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenKind;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::models::AuthPolicy;
use crate::domain::authentication::models::AuthResult;
use crate::domain::authentication::models::LoginCommand;
use crate::domain::authentication::ports::AuthServicePort;
use crate::domain::authentication::ports::RefreshTokenStore;
use crate::domain::user::models::Projection;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::ports::UserRepository;

/// Domain service implementation for authentication.
///
/// Owns the token codec and the refresh pairing store; users are read
/// through the repository port.
pub struct AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    repository: Arc<UR>,
    refresh_tokens: Arc<RS>,
    codec: Arc<TokenCodec>,
    password_hasher: PasswordHasher,
    policy: AuthPolicy,
}

impl<UR, RS> AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `refresh_tokens` - Access to refresh token pairing store
    /// * `codec` - Access and refresh token codec
    /// * `password_hasher` - Hasher used to verify stored credentials
    /// * `policy` - Lockout limit and failed login tracking
    pub fn new(
        repository: Arc<UR>,
        refresh_tokens: Arc<RS>,
        codec: Arc<TokenCodec>,
        password_hasher: PasswordHasher,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            repository,
            refresh_tokens,
            codec,
            password_hasher,
            policy,
        }
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.password_hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    fn verify_token(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        self.codec
            .verify(kind, token)
            .map_err(|e| AuthError::from_jwt(kind, e))
    }

    /// Load the subject of verified claims with its auth-sensitive fields.
    async fn load_subject(&self, kind: TokenKind, subject: Option<&str>) -> Result<User, AuthError> {
        let id = subject
            .and_then(|sub| UserId::from_string(sub).ok())
            .ok_or(AuthError::TokenInvalid(kind))?;

        self.repository
            .find_by_id(&id, Projection::Extended)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn on_password_mismatch(&self, user: &User) {
        if !self.policy.track_failed_logins {
            return;
        }

        match self.repository.record_auth_failure(&user.id).await {
            Ok(count) if count >= self.policy.auth_errors_limit => {
                tracing::warn!(user_id = %user.id, auth_errors = count, "Account locked after failed logins");
            }
            Ok(count) => {
                tracing::debug!(user_id = %user.id, auth_errors = count, "Recorded failed login");
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to record failed login");
            }
        }
    }
}

#[async_trait]
impl<UR, RS> AuthServicePort for AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    async fn login(&self, command: LoginCommand) -> Result<AuthResult, AuthError> {
        let user = self
            .repository
            .find_by_email(&command.email, Projection::Extended)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(hash) = user.password_hash.clone() else {
            tracing::debug!(user_id = %user.id, "Login attempt on account without local password");
            return Err(AuthError::PasswordMismatch);
        };

        if !self
            .verify_password(command.password.expose().to_string(), hash)
            .await?
        {
            self.on_password_mismatch(&user).await;
            return Err(AuthError::PasswordMismatch);
        }

        let mut user = user;
        if self.policy.track_failed_logins && user.auth_errors() > 0 {
            self.repository.clear_auth_failures(&user.id).await?;
            if let Some(meta) = user.meta.as_mut() {
                meta.auth_errors = 0;
            }
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user).await
    }

    async fn authorize(
        &self,
        access_token: &str,
        require_verified_email: bool,
    ) -> Result<User, AuthError> {
        let claims = self.verify_token(TokenKind::Access, access_token)?;

        let user = self.load_subject(TokenKind::Access, claims.subject()).await?;

        if !user.active {
            tracing::debug!(user_id = %user.id, "Rejected inactive account");
            return Err(AuthError::InactiveAccount);
        }

        if user.auth_errors() >= self.policy.auth_errors_limit {
            tracing::debug!(user_id = %user.id, "Rejected blocked account");
            return Err(AuthError::BlockedAccount);
        }

        if require_verified_email && !user.email_verified() {
            tracing::debug!(user_id = %user.id, "Rejected unverified email");
            return Err(AuthError::UnverifiedEmail);
        }

        Ok(user.without_credentials())
    }

    async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthResult, AuthError> {
        if !self.refresh_tokens.redeem(access_token, refresh_token).await? {
            return Err(AuthError::RefreshTokenNotFound);
        }

        let claims = self.verify_token(TokenKind::Refresh, refresh_token)?;

        let user = self.load_subject(TokenKind::Refresh, claims.subject()).await?;

        tracing::info!(user_id = %user.id, "Rotated token pair");
        self.issue(user).await
    }

    async fn issue(&self, user: User) -> Result<AuthResult, AuthError> {
        let tokens = self
            .codec
            .issue_pair(&user.id.to_string())
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        self.refresh_tokens
            .put(
                &tokens.access_token,
                &tokens.refresh_token,
                self.codec.refresh_ttl(),
            )
            .await?;

        Ok(AuthResult {
            user: user.without_credentials(),
            tokens,
        })
    }
}
