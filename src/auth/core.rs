//! Auth core: the single write path for authentication state.
//!
//! `login` is the only place a bearer token is minted; `logout` is the only
//! place one is revoked through the session. Both mutate the repository and
//! the session together so the two never disagree for longer than one
//! request.

use crate::auth::error::AuthError;
use crate::auth::models::{AuthToken, Authenticatable, TokenAttributes};
use crate::auth::repository::AuthRepository;
use crate::session::Session;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates login and logout against the repository and the session.
///
/// Constructed once and passed through request context; there is no ambient
/// process-wide instance.
pub struct Auth {
    repository: Arc<dyn AuthRepository>,
}

impl Auth {
    #[must_use]
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<dyn AuthRepository> {
        &self.repository
    }

    /// Log a user in: mint a token, persist its record with the supplied
    /// extra attributes, and bind it to the session.
    ///
    /// # Errors
    /// Fails if the token cannot be generated or the record cannot be
    /// persisted; the session is left untouched in that case.
    pub async fn login(
        &self,
        session: &mut Session,
        user: &dyn Authenticatable,
        attributes: TokenAttributes,
    ) -> Result<AuthToken, AuthError> {
        let token = generate_token()?;
        let record = AuthToken::new(token.clone(), user.id().to_string(), attributes);
        self.repository.persist_token(&record).await?;

        session.mark_authenticated(&token);
        session.remember_user(user.id());

        info!(user_id = user.id(), "user logged in");
        Ok(record)
    }

    /// Log the current session out.
    ///
    /// Deletes the matching token record if the session holds one (a missing
    /// record is already-logged-out, not an error), then clears the session.
    /// The cleared session is empty, so the close path deletes the stored
    /// record instead of writing it back; absent auth keys read as
    /// unauthenticated.
    ///
    /// # Errors
    /// Fails only if the repository delete fails.
    pub async fn logout(&self, session: &mut Session) -> Result<(), AuthError> {
        if let Some(token) = session.auth_token() {
            self.repository.delete_token(&token).await?;
            debug!("auth token revoked");
        }

        session.clear();
        session.reset_auth();
        Ok(())
    }
}

/// Generate a random 128-bit bearer token, hex-encoded (32 chars).
///
/// # Errors
/// Returns `AuthError::TokenGeneration` if the system RNG fails.
pub fn generate_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::TokenGeneration(err.to_string()))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use crate::auth::repository::MemoryRepository;
    use serde_json::json;

    fn member(id: &str) -> User {
        let mut user = User::new(id, "member");
        user.email = format!("{id}@example.com");
        user
    }

    fn auth_with_repo() -> (Auth, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        (Auth::new(repo.clone()), repo)
    }

    #[test]
    fn generated_tokens_are_32_hex_chars() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_tokens_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_token().unwrap()));
        }
    }

    #[tokio::test]
    async fn login_persists_record_and_binds_session() {
        let (auth, repo) = auth_with_repo();
        let mut session = crate::session::Session::fresh("sid".to_string());
        let user = member("u1");

        let mut attributes = TokenAttributes::new();
        attributes.insert("device".to_string(), json!("cli"));
        let record = auth.login(&mut session, &user, attributes).await.unwrap();

        assert_eq!(record.user_id, "u1");
        assert_eq!(record.attributes.get("device"), Some(&json!("cli")));
        assert!(session.is_authenticated());
        assert_eq!(session.auth_token(), Some(record.token.clone()));
        assert_eq!(session.remembered_user_id(), Some("u1".to_string()));

        let stored = repo
            .find_token_by_value(&record.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, "u1");
    }

    #[tokio::test]
    async fn sequential_logins_mint_distinct_tokens() {
        let (auth, _) = auth_with_repo();
        let mut session = crate::session::Session::fresh("sid".to_string());
        let first = auth
            .login(&mut session, &member("u1"), TokenAttributes::new())
            .await
            .unwrap();
        let second = auth
            .login(&mut session, &member("u2"), TokenAttributes::new())
            .await
            .unwrap();
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn logout_revokes_token_and_empties_session() {
        let (auth, repo) = auth_with_repo();
        let mut session = crate::session::Session::fresh("sid".to_string());
        let record = auth
            .login(&mut session, &member("u1"), TokenAttributes::new())
            .await
            .unwrap();
        session.insert("cart_items", json!(3));

        auth.logout(&mut session).await.unwrap();

        assert!(repo
            .find_token_by_value(&record.token)
            .await
            .unwrap()
            .is_none());
        assert!(session.is_empty());
        assert!(!session.is_authenticated());
        assert_eq!(session.auth_token(), None);
    }

    #[tokio::test]
    async fn logout_is_idempotent_without_token() {
        let (auth, _) = auth_with_repo();
        let mut session = crate::session::Session::fresh("sid".to_string());
        auth.logout(&mut session).await.unwrap();
        auth.logout(&mut session).await.unwrap();
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn logout_with_stale_token_is_not_an_error() {
        let (auth, _) = auth_with_repo();
        let mut session = crate::session::Session::fresh("sid".to_string());
        session.mark_authenticated("deadbeefdeadbeefdeadbeefdeadbeef");
        auth.logout(&mut session).await.unwrap();
        assert!(session.is_empty());
    }
}
