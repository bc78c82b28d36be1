use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::authentication::errors::AuthError;
use crate::domain::user::models::Password;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::UserId;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::FieldErrors;
use crate::user::errors::UserError;

/// Update a profile. Only the owner or an admin may do so.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(caller)): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(UserError::from)?;

    if caller.id != user_id && !caller.has_role(Role::Admin) {
        return Err(AuthError::AccessRestricted.into());
    }

    let Json(body) = body?;

    state
        .user_service
        .update_user(&user_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// HTTP request body for updating a user (all fields optional)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    email_newsletters: Option<bool>,
}

impl UpdateUserRequest {
    fn try_into_command(self) -> Result<UpdateUserCommand, ApiError> {
        let mut errors = FieldErrors::new();

        let first_name = self
            .first_name
            .and_then(|name| errors.check("firstName", PersonName::new(name)));
        let last_name = self
            .last_name
            .and_then(|name| errors.check("lastName", PersonName::new(name)));
        let password = self
            .password
            .and_then(|password| errors.check("password", Password::new(password)));

        if !errors.is_empty() {
            return Err(errors.into_error());
        }

        Ok(UpdateUserCommand {
            first_name,
            last_name,
            password,
            email_newsletters: self.email_newsletters,
        })
    }
}
