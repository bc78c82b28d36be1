use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiSuccess;
use super::AuthResponseData;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::middleware::bearer_token;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::FieldErrors;

/// Exchange the current access token (header) and its refresh token (body)
/// for a new pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RefreshTokenRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let access_token = bearer_token(&headers)?;
    let Json(body) = body?;

    let mut errors = FieldErrors::new();
    let Some(refresh_token) = errors.require("refreshToken", body.refresh_token) else {
        return Err(errors.into_error());
    };

    state
        .auth_service
        .refresh(access_token, &refresh_token)
        .await
        .map_err(ApiError::from)
        .map(|result| ApiSuccess::new(StatusCode::OK, result.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequestBody {
    refresh_token: Option<String>,
}
