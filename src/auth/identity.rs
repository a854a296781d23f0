//! Identity resolution for the current request.
//!
//! An ordered chain of loaders turns a request plus its session into an
//! identity; the first loader that produces a user wins. A repository error
//! in one loader degrades to trying the next, so a flaky lookup never turns
//! an otherwise-resolvable request into a crash.

use crate::auth::extract::{extract_request_token, ExtractionMode};
use crate::auth::models::Authenticatable;
use crate::auth::repository::AuthRepository;
use crate::session::Session;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::warn;

/// The resolved identity of the current request.
///
/// Anonymous until a loader resolves a user; `is_authenticated` reflects the
/// session's authenticated flag, not merely that a user record was found.
#[derive(Clone)]
pub struct Identity {
    user: Option<Arc<dyn Authenticatable>>,
    authenticated: bool,
}

impl Identity {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user: None,
            authenticated: false,
        }
    }

    #[must_use]
    pub fn authenticated(user: Arc<dyn Authenticatable>) -> Self {
        Self {
            user: Some(user),
            authenticated: true,
        }
    }

    pub(crate) fn resolved(user: Arc<dyn Authenticatable>, authenticated: bool) -> Self {
        Self {
            user: Some(user),
            authenticated,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }

    #[must_use]
    pub fn user(&self) -> Option<&Arc<dyn Authenticatable>> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_deref().map(Authenticatable::id)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.user.as_deref().map(Authenticatable::email)
    }

    #[must_use]
    pub fn user_type(&self) -> Option<&str> {
        self.user.as_deref().map(Authenticatable::user_type)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id())
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// Run the resolution chain for one request.
///
/// 1. Request-token loader: a token presented directly on the request
///    resolves through its repository record; the session is marked
///    authenticated as a side effect, which is what lets a single bearer
///    token authenticate a stateless request with no prior session write.
/// 2. Session-user loader: a remembered user id in the session.
/// 3. Token-value loader: the session's `auth_token` value.
///
/// All fail: anonymous.
pub async fn resolve(
    mode: ExtractionMode,
    headers: &HeaderMap,
    session: &mut Session,
    repository: &Arc<dyn AuthRepository>,
) -> Identity {
    if let Some(identity) = load_from_request_token(mode, headers, session, repository).await {
        return identity;
    }

    if let Some(identity) = load_from_remembered_user(session, repository).await {
        return identity;
    }

    if let Some(identity) = load_from_session_token(session, repository).await {
        return identity;
    }

    Identity::anonymous()
}

async fn load_from_request_token(
    mode: ExtractionMode,
    headers: &HeaderMap,
    session: &mut Session,
    repository: &Arc<dyn AuthRepository>,
) -> Option<Identity> {
    let token = extract_request_token(mode, headers)?;
    let record = match repository.find_token_by_value(&token).await {
        Ok(record) => record?,
        Err(err) => {
            warn!("request-token loader failed: {err}");
            return None;
        }
    };
    let user = match repository.find_user_by_id(&record.user_id).await {
        Ok(user) => user?,
        Err(err) => {
            warn!("request-token loader failed resolving user: {err}");
            return None;
        }
    };

    session.mark_authenticated(&record.token);
    Some(Identity::authenticated(user))
}

async fn load_from_remembered_user(
    session: &Session,
    repository: &Arc<dyn AuthRepository>,
) -> Option<Identity> {
    let user_id = session.remembered_user_id()?;
    match repository.find_user_by_id(&user_id).await {
        Ok(user) => Some(Identity::resolved(user?, session.is_authenticated())),
        Err(err) => {
            warn!("session-user loader failed: {err}");
            None
        }
    }
}

async fn load_from_session_token(
    session: &Session,
    repository: &Arc<dyn AuthRepository>,
) -> Option<Identity> {
    let token = session.auth_token()?;
    let record = match repository.find_token_by_value(&token).await {
        Ok(record) => record?,
        Err(err) => {
            warn!("token-value loader failed: {err}");
            return None;
        }
    };
    match repository.find_user_by_id(&record.user_id).await {
        Ok(user) => Some(Identity::resolved(user?, session.is_authenticated())),
        Err(err) => {
            warn!("token-value loader failed resolving user: {err}");
            None
        }
    }
}
