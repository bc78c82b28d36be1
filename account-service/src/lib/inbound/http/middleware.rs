use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::errors::ApiError;
use crate::domain::authentication::errors::AuthError;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;

/// Extension type holding the user resolved from the access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Options for one mounting of the authorization middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthOptions {
    pub force_email_verified: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            force_email_verified: true,
        }
    }
}

/// Middleware state: the application state plus this mounting's options.
#[derive(Clone)]
pub struct AuthGuard {
    state: AppState,
    options: AuthOptions,
}

impl AuthGuard {
    pub fn new(state: AppState, options: AuthOptions) -> Self {
        Self { state, options }
    }
}

/// Middleware that resolves the bearer token to a user and adds it to request extensions
pub async fn authenticate(
    State(guard): State<AuthGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;

    let user = guard
        .state
        .auth_service
        .authorize(token, guard.options.force_email_verified)
        .await?;

    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

/// Role gate. Must run after [`authenticate`]; a request without a resolved
/// user is denied.
pub async fn require_role(
    State(role): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match req.extensions().get::<AuthenticatedUser>() {
        Some(AuthenticatedUser(user)) if user.has_role(role) => Ok(next.run(req).await),
        Some(AuthenticatedUser(user)) => {
            tracing::debug!(user_id = %user.id, required = %role, "Role check failed");
            Err(AuthError::AccessRestricted.into())
        }
        None => Err(AuthError::AccessRestricted.into()),
    }
}

/// Token from an `Authorization: <scheme> <token>` header.
///
/// # Errors
/// * `NoTokenProvided` - Header is missing
/// * `TokenInvalid` - Header is not exactly two space separated parts
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(ApiError::no_token_provided)?
        .to_str()
        .map_err(|_| ApiError::token_invalid())?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [_scheme, token] if !token.is_empty() => Ok(*token),
        _ => Err(ApiError::token_invalid()),
    }
}
