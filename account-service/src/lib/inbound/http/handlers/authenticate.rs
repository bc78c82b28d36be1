use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiSuccess;
use super::AuthResponseData;
use crate::domain::authentication::models::LoginCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::FieldErrors;

pub async fn authenticate(
    State(state): State<AppState>,
    body: Result<Json<AuthenticateRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .auth_service
        .login(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|result| ApiSuccess::new(StatusCode::OK, result.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateRequestBody {
    email: Option<String>,
    password: Option<String>,
}

impl AuthenticateRequestBody {
    fn try_into_command(self) -> Result<LoginCommand, ApiError> {
        let mut errors = FieldErrors::new();

        let email = errors
            .require("email", self.email)
            .and_then(|email| errors.check("email", EmailAddress::new(email)));
        let password = errors
            .require("password", self.password)
            .and_then(|password| errors.check("password", Password::new(password)));

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => {
                Ok(LoginCommand { email, password })
            }
            _ => Err(errors.into_error()),
        }
    }
}
