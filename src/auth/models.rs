//! User and token records, plus the capability contract the core depends on.
//!
//! The core never assumes a concrete user type: it sees hosts' users through
//! [`Authenticatable`]. The bundled [`User`] record implements the contract
//! and is what the shipped repositories return.

use crate::auth::error::AuthError;
use crate::auth::password::PasswordHasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Extra attributes applied to a token record at creation time.
pub type TokenAttributes = BTreeMap<String, Value>;

/// Capability contract for host user types.
pub trait Authenticatable: Send + Sync {
    fn id(&self) -> &str;
    fn email(&self) -> &str;
    /// Role discriminator; `"admin"` is reserved for elevated access.
    fn user_type(&self) -> &str;
    fn is_active(&self) -> bool;
    /// Distinguishes a genuine account from an anonymous placeholder.
    fn is_real(&self) -> bool {
        true
    }
    /// Stored password hash, verified through the hashing collaborator.
    fn password_hash(&self) -> &str;
}

/// The crate's concrete user record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    pub real: bool,
    pub user_type: String,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, user_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: String::new(),
            password: String::new(),
            active: true,
            real: true,
            user_type: user_type.into(),
        }
    }

    /// Set email and password in one step.
    ///
    /// Exactly one of `password` (plaintext, hashed through `hasher`) or
    /// `password_hash` (pre-hashed) must be supplied.
    ///
    /// # Errors
    /// Returns `AuthError::DuplicateSecurityAttributes` when both or neither
    /// are supplied; nothing is mutated in that case.
    pub fn set_security_attrs(
        &mut self,
        email: &str,
        password: Option<&str>,
        password_hash: Option<&str>,
        hasher: &dyn PasswordHasher,
    ) -> Result<(), AuthError> {
        let hashed = match (password, password_hash) {
            (Some(plain), None) => hasher.hash(plain)?,
            (None, Some(hash)) => hash.to_string(),
            _ => return Err(AuthError::DuplicateSecurityAttributes),
        };
        self.password = hashed;
        self.email = email.to_string();
        Ok(())
    }

    #[must_use]
    pub fn verify_password(&self, password: &str, hasher: &dyn PasswordHasher) -> bool {
        hasher.verify(password, &self.password)
    }
}

impl Authenticatable for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn user_type(&self) -> &str {
        &self.user_type
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_real(&self) -> bool {
        self.real
    }

    fn password_hash(&self) -> &str {
        &self.password
    }
}

/// Durable mapping from a bearer token to a user identity.
///
/// Exactly one live record exists per outstanding login; deleting it
/// invalidates that login everywhere it is checked. Records are never
/// mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub attributes: TokenAttributes,
}

impl AuthToken {
    #[must_use]
    pub fn new(token: String, user_id: String, attributes: TokenAttributes) -> Self {
        Self {
            token,
            user_id,
            attributes,
        }
    }
}
