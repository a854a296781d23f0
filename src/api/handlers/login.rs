use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::api::handlers::valid_email;
use crate::api::{AppState, SessionHandle};
use crate::auth::{unauthorized_response, TokenAttributes};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Keep the session alive for the permanent lifetime instead of a day.
    #[serde(default)]
    pub permanent: bool,
    /// Extra attributes recorded on the token at creation time.
    #[serde(default)]
    #[schema(value_type = std::collections::BTreeMap<String, Object>)]
    pub attributes: TokenAttributes,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/login",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Unknown user or wrong password"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    state: Extension<Arc<AppState>>,
    session: Extension<SessionHandle>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if !valid_email(&payload.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    // Unknown account, wrong password, and inactive account all answer with
    // the same fixed 401 so accounts cannot be probed.
    let user = match state.auth.repository().find_user_by_email(&payload.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized_response(),
        Err(err) => {
            error!("login lookup failed: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !user.is_active() || !state.hasher.verify(&payload.password, user.password_hash()) {
        debug!("rejected login for inactive account or bad password");
        return unauthorized_response();
    }

    let mut session = session.lock().await;
    if payload.permanent {
        session.set_permanent(true);
    }

    match state
        .auth
        .login(&mut session, user.as_ref(), payload.attributes)
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(LoginResponse {
                token: record.token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("login failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
