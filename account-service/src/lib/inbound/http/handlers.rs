use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::authentication::models::AuthResult;
use crate::domain::user::models::AccountOrigin;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;

pub mod admin;
pub mod authenticate;
pub mod create_user;
pub mod get_me;
pub mod get_user;
pub mod list_users;
pub mod refresh_token;
pub mod update_user;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Outbound user representation. Never carries the password hash or the
/// password reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub active: bool,
    pub roles: Vec<Role>,
    pub origin: Vec<AccountOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<UserMetaData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetaData {
    pub email_newsletters: bool,
    pub email_verified: bool,
    pub auth_errors: u32,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.as_str().to_string(),
            last_name: user.last_name.as_str().to_string(),
            avatar: user.avatar.clone(),
            active: user.active,
            roles: user.roles.clone(),
            origin: user.origin.clone(),
            meta: user.meta.as_ref().map(|meta| UserMetaData {
                email_newsletters: meta.email_newsletters,
                email_verified: meta.email_verified,
                auth_errors: meta.auth_errors,
            }),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{user}` envelope for single-user responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponseData {
    pub user: UserData,
}

impl From<&User> for UserResponseData {
    fn from(user: &User) -> Self {
        Self { user: user.into() }
    }
}

/// Login, registration and refresh response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseData {
    pub user: UserData,
    pub access_token: String,
    pub refresh_token: String,
}

impl From<AuthResult> for AuthResponseData {
    fn from(result: AuthResult) -> Self {
        Self {
            user: (&result.user).into(),
            access_token: result.tokens.access_token,
            refresh_token: result.tokens.refresh_token,
        }
    }
}
