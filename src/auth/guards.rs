//! Access guards keyed on user type.
//!
//! Guards are pure predicates over the resolved [`Identity`]; denial maps to
//! one fixed 401 JSON payload. Policy: the admin type alone is never
//! sufficient; every guard requires an authenticated identity first, and
//! admins then bypass the explicit role list.

use crate::auth::identity::Identity;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Reserved user type with elevated access in all guards.
pub const ADMIN_USER_TYPE: &str = "admin";

/// A guard denied the request.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("not authorized")]
pub struct Unauthorized;

/// Allow authenticated identities whose type is in `types`, or admins.
///
/// # Errors
/// Returns [`Unauthorized`] for anonymous or unauthenticated identities and
/// for authenticated identities whose type is neither listed nor admin.
pub fn require_roles(identity: &Identity, types: &[&str]) -> Result<(), Unauthorized> {
    if !identity.is_authenticated() {
        return Err(Unauthorized);
    }
    match identity.user_type() {
        Some(user_type) if user_type == ADMIN_USER_TYPE || types.contains(&user_type) => Ok(()),
        _ => Err(Unauthorized),
    }
}

/// Shorthand for a guard that only admits the admin type.
///
/// # Errors
/// Returns [`Unauthorized`] unless the identity is an authenticated admin.
pub fn require_admin(identity: &Identity) -> Result<(), Unauthorized> {
    require_roles(identity, &[])
}

/// The fixed denial payload: 401, `application/json`, no internal detail.
#[must_use]
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "msg": "Not authorized",
            "code": "not_authorized",
        })),
    )
        .into_response()
}

/// Middleware form of [`require_admin`] for routes wired with
/// `axum::middleware::from_fn`. Expects the session layer to have inserted
/// the resolved [`Identity`] as a request extension.
pub async fn admin_guard(request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_else(Identity::anonymous);

    if require_admin(&identity).is_err() {
        return unauthorized_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use std::sync::Arc;

    fn identity_of(user_type: &str, authenticated: bool) -> Identity {
        let mut user = User::new("u1", user_type);
        user.email = "user@example.com".to_string();
        // `authenticated: false` models a resolved user whose session never
        // carried the authenticated flag.
        Identity::resolved(Arc::new(user), authenticated)
    }

    #[test]
    fn role_guard_allows_matching_type() {
        let identity = identity_of("editor", true);
        assert_eq!(require_roles(&identity, &["editor"]), Ok(()));
    }

    #[test]
    fn role_guard_denies_other_type() {
        let identity = identity_of("viewer", true);
        assert_eq!(require_roles(&identity, &["editor"]), Err(Unauthorized));
    }

    #[test]
    fn role_guard_allows_admin_for_any_list() {
        let identity = identity_of("admin", true);
        assert_eq!(require_roles(&identity, &["editor"]), Ok(()));
        assert_eq!(require_roles(&identity, &[]), Ok(()));
    }

    #[test]
    fn role_guard_denies_unauthenticated_regardless_of_type() {
        // Admin type alone never passes; authentication comes first.
        let identity = identity_of("admin", false);
        assert_eq!(require_roles(&identity, &["editor"]), Err(Unauthorized));
        assert_eq!(require_admin(&identity), Err(Unauthorized));
    }

    #[test]
    fn role_guard_denies_anonymous() {
        assert_eq!(
            require_roles(&Identity::anonymous(), &["editor"]),
            Err(Unauthorized)
        );
    }

    #[test]
    fn admin_guard_denies_non_admin() {
        let identity = identity_of("editor", true);
        assert_eq!(require_admin(&identity), Err(Unauthorized));
    }

    #[tokio::test]
    async fn unauthorized_response_has_fixed_payload() {
        let response = unauthorized_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["msg"], "Not authorized");
        assert_eq!(payload["code"], "not_authorized");
    }
}
