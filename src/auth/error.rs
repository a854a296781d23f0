//! Error taxonomy for the auth layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unrecognized extraction mode or unusable connection options. Fatal at
    /// startup, never recovered at request time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Both a plaintext and a pre-hashed password were supplied, or neither.
    #[error("must supply exactly one of password or password hash")]
    DuplicateSecurityAttributes,
    /// The user/token repository failed.
    #[error("repository error: {0}")]
    Repository(#[source] anyhow::Error),
    /// Random token material could not be generated.
    #[error("failed to generate token: {0}")]
    TokenGeneration(String),
    /// The password hashing collaborator failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
