use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use serde::Serialize;

use crate::domain::authentication::errors::AuthError;
use crate::user::errors::UserError;

/// Classification of every failure that leaves the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoTokenProvided,
    TokenInvalid,
    TokenExpired,
    NotFound,
    Unauthorized,
    TooManyRequests,
    Unprocessable,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NoTokenProvided
            | ErrorKind::TokenInvalid
            | ErrorKind::TokenExpired
            | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human readable label sent as `error`.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NoTokenProvided
            | ErrorKind::TokenInvalid
            | ErrorKind::TokenExpired
            | ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::Internal => "Internal Server Error",
        }
    }

    /// Machine readable key. Token failures have fixed keys, everything else
    /// derives it from the label: `Not Found` becomes `NOT_FOUND`.
    pub fn key(&self) -> String {
        match self {
            ErrorKind::NoTokenProvided => "NO_TOKEN_PROVIDED".to_string(),
            ErrorKind::TokenInvalid => "TOKEN_INVALID".to_string(),
            ErrorKind::TokenExpired => "TOKEN_EXPIRED".to_string(),
            _ => self
                .label()
                .split_whitespace()
                .map(str::to_uppercase)
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// Field-level detail attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: Some(param.into()),
            message: message.into(),
        }
    }
}

/// Error returned by every handler and middleware.
///
/// Rendered once by its `IntoResponse` impl, which is the only place
/// failures are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    message: Option<String>,
    data: Vec<FieldError>,
    retry_after_secs: Option<u64>,
    /// Logged but never sent to the client.
    internal_detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    status: u16,
    error: &'static str,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data: Vec<FieldError>,
}

impl ApiError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            data: Vec::new(),
            retry_after_secs: None,
            internal_detail: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, param: impl Into<String>, message: impl Into<String>) -> Self {
        self.data.push(FieldError::new(param, message));
        self
    }

    pub fn with_data(mut self, data: Vec<FieldError>) -> Self {
        self.data.extend(data);
        self
    }

    pub fn no_token_provided() -> Self {
        Self::new(ErrorKind::NoTokenProvided)
            .with_message("No token provided")
            .with_field("header/authorization", "no token provided")
    }

    pub fn token_invalid() -> Self {
        Self::new(ErrorKind::TokenInvalid).with_message("Invalid token")
    }

    pub fn token_expired(param: &str, expired_at: Option<i64>) -> Self {
        let detail = expired_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|at| format!("expired at {}", at.to_rfc3339()))
            .unwrap_or_else(|| "expired".to_string());

        Self::new(ErrorKind::TokenExpired)
            .with_message("Token expired")
            .with_field(param, detail)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound).with_message(message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized).with_message(message)
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            ..Self::new(ErrorKind::TooManyRequests).with_message("Too many requests")
        }
    }

    pub fn unprocessable(data: Vec<FieldError>) -> Self {
        Self::new(ErrorKind::Unprocessable)
            .with_message("Validation failed")
            .with_data(data)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            internal_detail: Some(detail.into()),
            ..Self::new(ErrorKind::Internal)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> &[FieldError] {
        &self.data
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status();
        let key = self.kind.key();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                key = %key,
                detail = self.internal_detail.as_deref().unwrap_or_default(),
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                key = %key,
                reason = self.message.as_deref().unwrap_or_default(),
                "Request rejected"
            );
        }

        let body = ApiErrorBody {
            status: status.as_u16(),
            error: self.kind.label(),
            key,
            message: self.message,
            data: self.data,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound => ApiError::not_found("User not found"),
            AuthError::PasswordMismatch => ApiError::unauthorized("Password does not match")
                .with_field("password", "password does not match"),
            AuthError::InactiveAccount => ApiError::unauthorized("Inactive account"),
            AuthError::BlockedAccount => ApiError::unauthorized("Blocked account"),
            AuthError::UnverifiedEmail => ApiError::unauthorized("Unverified email"),
            AuthError::AccessRestricted => ApiError::unauthorized("Restrict access"),
            AuthError::RefreshTokenNotFound => ApiError::not_found("Refresh token not found")
                .with_field("refreshToken", "refresh token not found"),
            AuthError::TokenExpired { kind, expired_at } => {
                ApiError::token_expired(kind.param(), expired_at)
            }
            AuthError::TokenInvalid(auth::TokenKind::Refresh) => {
                ApiError::new(ErrorKind::TokenInvalid)
                    .with_message("Invalid refresh token")
                    .with_field("refreshToken", "invalid refresh token")
            }
            AuthError::TokenInvalid(auth::TokenKind::Access) => ApiError::token_invalid(),
            AuthError::User(e) => ApiError::from(e),
            AuthError::Signing(_) | AuthError::Password(_) | AuthError::Internal(_) => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::not_found("User not found"),
            UserError::EmailAlreadyExists(_) => ApiError::unprocessable(vec![FieldError::new(
                "email",
                "email already in use",
            )]),
            UserError::InvalidEmail(e) => {
                ApiError::unprocessable(vec![FieldError::new("email", e.to_string())])
            }
            UserError::InvalidPassword(e) => {
                ApiError::unprocessable(vec![FieldError::new("password", e.to_string())])
            }
            UserError::InvalidName(e) => ApiError::unprocessable(vec![FieldError {
                param: None,
                message: e.to_string(),
            }]),
            UserError::InvalidUserId(e) => {
                ApiError::unprocessable(vec![FieldError::new("id", e.to_string())])
            }
            UserError::InvalidRole(_)
            | UserError::InvalidOrigin(_)
            | UserError::Password(_)
            | UserError::DatabaseError(_)
            | UserError::Unknown(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unprocessable(vec![FieldError {
            param: Some("body".to_string()),
            message: rejection.body_text(),
        }])
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use auth::TokenKind;
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, Option<String>, Value) {
        let response = err.into_response();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_keys_derive_from_labels() {
        assert_eq!(ErrorKind::NotFound.key(), "NOT_FOUND");
        assert_eq!(ErrorKind::Internal.key(), "INTERNAL_SERVER_ERROR");
        assert_eq!(ErrorKind::TooManyRequests.key(), "TOO_MANY_REQUESTS");
        assert_eq!(ErrorKind::Unprocessable.key(), "UNPROCESSABLE");
        assert_eq!(ErrorKind::Unauthorized.key(), "UNAUTHORIZED");
        assert_eq!(ErrorKind::NoTokenProvided.key(), "NO_TOKEN_PROVIDED");
        assert_eq!(ErrorKind::TokenExpired.key(), "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_no_token_provided_body() {
        let (status, _, body) = render(ApiError::no_token_provided()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["key"], "NO_TOKEN_PROVIDED");
        assert_eq!(body["data"][0]["param"], "header/authorization");
    }

    #[tokio::test]
    async fn test_password_mismatch_is_field_tagged() {
        let (status, _, body) = render(AuthError::PasswordMismatch.into()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["key"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Password does not match");
        assert_eq!(body["data"][0]["param"], "password");
    }

    #[tokio::test]
    async fn test_expired_refresh_token_reports_expiry() {
        let err: ApiError = AuthError::TokenExpired {
            kind: TokenKind::Refresh,
            expired_at: Some(0),
        }
        .into();
        let (status, _, body) = render(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["key"], "TOKEN_EXPIRED");
        assert_eq!(body["data"][0]["param"], "refreshToken");
        assert_eq!(
            body["data"][0]["message"],
            "expired at 1970-01-01T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_invalid_refresh_token_is_field_tagged() {
        let err: ApiError = AuthError::TokenInvalid(TokenKind::Refresh).into();
        let (status, _, body) = render(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert_eq!(body["key"], "TOKEN_INVALID");
        assert_eq!(body["message"], "Invalid refresh token");
        assert_eq!(body["data"][0]["param"], "refreshToken");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unprocessable() {
        let err: ApiError = UserError::EmailAlreadyExists("a@b.com".to_string()).into();
        let (status, _, body) = render(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["key"], "UNPROCESSABLE");
        assert_eq!(body["data"][0]["param"], "email");
        assert_eq!(body["data"][0]["message"], "email already in use");
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let (status, retry_after, body) = render(ApiError::too_many_requests(42)).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("42"));
        assert_eq!(body["key"], "TOO_MANY_REQUESTS");
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let err: ApiError = UserError::DatabaseError("connection refused".to_string()).into();
        let (status, _, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["key"], "INTERNAL_SERVER_ERROR");
        assert!(body.get("message").is_none());
        assert!(body.get("data").is_none());
    }
}
