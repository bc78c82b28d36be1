use axum::http::StatusCode;
use axum::Extension;

use super::ApiSuccess;
use super::UserResponseData;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn get_me(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiSuccess<UserResponseData> {
    ApiSuccess::new(StatusCode::OK, (&user).into())
}
