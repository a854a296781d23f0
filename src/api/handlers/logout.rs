use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::api::{AppState, SessionHandle};

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cleared and token revoked"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    state: Extension<Arc<AppState>>,
    session: Extension<SessionHandle>,
) -> Response {
    let mut session = session.lock().await;

    // Logging out an anonymous session is a no-op, still 204.
    match state.auth.logout(&mut session).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("logout failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
