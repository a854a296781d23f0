//! Per-request session middleware.
//!
//! Opens the session before the wrapped handler runs, resolves the identity,
//! and persists the session after the handler returns. Handlers reach the
//! session through a [`SessionHandle`] request extension and the identity
//! through an [`Identity`] extension.

use crate::api::AppState;
use crate::auth;
use crate::session::Session;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Shared handle to the request's session.
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

/// Open/resolve/close wrapper around every routed handler.
///
/// A failed write-back surfaces as 500: the handler may have mutated state
/// the client would otherwise believe was saved.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mode = state.sessions.config().extraction_mode();
    let mut session = state.sessions.open(request.headers()).await;
    let identity = auth::resolve(
        mode,
        request.headers(),
        &mut session,
        state.auth.repository(),
    )
    .await;

    let handle = SessionHandle(Arc::new(Mutex::new(session)));
    request.extensions_mut().insert(handle.clone());
    request.extensions_mut().insert(identity);

    let response = next.run(request).await;

    let session = handle.lock().await;
    if let Err(err) = state.sessions.close(&session).await {
        error!("failed to persist session: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    response
}
