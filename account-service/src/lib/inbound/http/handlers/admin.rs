use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn admin(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiSuccess<AdminResponseData> {
    tracing::info!(user_id = %user.id, "Admin area accessed");

    ApiSuccess::new(
        StatusCode::OK,
        AdminResponseData {
            message: "Welcome to the admin area".to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminResponseData {
    pub message: String,
}
