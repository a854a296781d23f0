use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Identity;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Resolved identity of the request", body = MeResponse, content_type = "application/json"),
    ),
    tag = "auth"
)]
pub async fn me(identity: Extension<Identity>) -> Response {
    Json(MeResponse {
        authenticated: identity.is_authenticated(),
        user_id: identity.user_id().map(str::to_string),
        email: identity.email().map(str::to_string),
        user_type: identity.user_type().map(str::to_string),
    })
    .into_response()
}
