use auth::TokenPair;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::User;

/// Outcome of a login, registration or refresh: the user and a freshly
/// registered token pair.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Command to authenticate with email and password
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: Password,
}

/// Account state rules applied by the auth service.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    /// `meta.authErrors` value at which an account is treated as blocked.
    pub auth_errors_limit: u32,
    /// Increment `meta.authErrors` on password mismatch and reset it on success.
    pub track_failed_logins: bool,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            auth_errors_limit: 5,
            track_failed_logins: false,
        }
    }
}
