use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiSuccess;
use super::AuthResponseData;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::PersonName;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::FieldErrors;

/// Register a local account and sign it in.
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let Json(body) = body?;

    let user = state
        .user_service
        .create_user(body.try_into_command()?)
        .await?;

    state
        .auth_service
        .issue(user)
        .await
        .map_err(ApiError::from)
        .map(|result| ApiSuccess::new(StatusCode::CREATED, result.into()))
}

/// HTTP request body for registering a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar: Option<String>,
    email_newsletters: Option<bool>,
    email_verified: Option<bool>,
}

impl CreateUserRequest {
    fn try_into_command(self) -> Result<CreateUserCommand, ApiError> {
        let mut errors = FieldErrors::new();

        let email = errors
            .require("email", self.email)
            .and_then(|email| errors.check("email", EmailAddress::new(email)));
        let password = errors
            .require("password", self.password)
            .and_then(|password| errors.check("password", Password::new(password)));
        let first_name = errors
            .require("firstName", self.first_name)
            .and_then(|name| errors.check("firstName", PersonName::new(name)));
        let last_name = errors
            .require("lastName", self.last_name)
            .and_then(|name| errors.check("lastName", PersonName::new(name)));

        match (email, password, first_name, last_name) {
            (Some(email), Some(password), Some(first_name), Some(last_name)) if errors.is_empty() => {
                Ok(CreateUserCommand {
                    email,
                    first_name,
                    last_name,
                    password,
                    avatar: self.avatar,
                    email_newsletters: self.email_newsletters.unwrap_or(false),
                    email_verified: self.email_verified.unwrap_or(false),
                })
            }
            _ => Err(errors.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            email: Some("A@B.com".to_string()),
            password: Some("abc12345".to_string()),
            first_name: Some("A".to_string()),
            last_name: Some("B".to_string()),
            avatar: None,
            email_newsletters: Some(false),
            email_verified: None,
        }
    }

    #[test]
    fn test_valid_request_becomes_command() {
        let command = request().try_into_command().unwrap();

        assert_eq!(command.email.as_str(), "a@b.com");
        assert_eq!(command.first_name.as_str(), "A");
        assert!(!command.email_verified);
    }

    #[test]
    fn test_invalid_fields_are_tagged() {
        let err = CreateUserRequest {
            password: Some("no spaces allowed".to_string()),
            first_name: Some(String::new()),
            last_name: None,
            ..request()
        }
        .try_into_command()
        .unwrap_err();

        let params: Vec<_> = err
            .data()
            .iter()
            .filter_map(|field| field.param.as_deref())
            .collect();
        assert_eq!(params, vec!["password", "firstName", "lastName"]);
    }
}
