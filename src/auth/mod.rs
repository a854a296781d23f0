//! Bearer-token authentication: models, repository, core, identity, guards.
//!
//! The flow for one request: the session interface opens a session keyed by
//! the request-supplied token, the resolver turns request plus session into
//! an [`Identity`], guards gate the handler on that identity, and handlers
//! may call [`Auth::login`]/[`Auth::logout`] to mutate authentication state.
//! The core owns no concrete user type and no process-wide state; the
//! repository and hashing collaborators are injected.

mod core;
mod error;
mod extract;
mod guards;
mod identity;
mod models;
mod password;
mod repository;

pub use core::{generate_token, Auth};
pub use error::AuthError;
pub use extract::{extract_request_token, ExtractionMode, TOKEN_COOKIE, TOKEN_HEADER};
pub use guards::{
    admin_guard, require_admin, require_roles, unauthorized_response, Unauthorized,
    ADMIN_USER_TYPE,
};
pub use identity::{resolve, Identity};
pub use models::{AuthToken, Authenticatable, TokenAttributes, User};
pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::{AuthRepository, MemoryRepository, PgRepository};
