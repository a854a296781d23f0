//! Token-keyed session interface.
//!
//! Opens a session from the request-supplied token at request-open time and
//! persists it at request-close time. The session id is the bearer token
//! itself, so a login token minted in one request keys the session of the
//! next one; no cookie round-trip is required in header mode.

use crate::auth::{extract_request_token, ExtractionMode};
use crate::session::codec::{self, CodecError};
use crate::session::store::{StoreError, TokenStore};
use crate::session::Session;
use axum::http::HeaderMap;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Default TTL for non-permanent sessions: one day.
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;
/// Default lifetime for permanent sessions: 31 days.
pub const DEFAULT_PERMANENT_TTL_SECONDS: u64 = 31 * 86_400;
/// Default key prefix in the token store.
pub const DEFAULT_KEY_PREFIX: &str = "session:";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    key_prefix: String,
    extraction_mode: ExtractionMode,
    default_ttl_seconds: u64,
    permanent_ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            extraction_mode: ExtractionMode::default(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            permanent_ttl_seconds: DEFAULT_PERMANENT_TTL_SECONDS,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.extraction_mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_ttl_seconds(mut self, seconds: u64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_permanent_ttl_seconds(mut self, seconds: u64) -> Self {
        self.permanent_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn extraction_mode(&self) -> ExtractionMode {
        self.extraction_mode
    }
}

/// Orchestrates session lookup and write-back against the token store.
pub struct SessionInterface {
    store: Arc<dyn TokenStore>,
    config: SessionConfig,
}

impl SessionInterface {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the session for a request.
    ///
    /// Never fails the request: a store outage or a corrupt stored payload
    /// degrades to a fresh session that reuses the presented id, so a later
    /// `open` with the same token stays idempotent.
    pub async fn open(&self, headers: &HeaderMap) -> Session {
        let Some(sid) = extract_request_token(self.config.extraction_mode, headers) else {
            return Session::fresh(generate_sid());
        };

        match self.store.get(&self.key_for(&sid)).await {
            Ok(Some(bytes)) => match codec::decode(&bytes) {
                Ok(data) => Session::restored(sid, data),
                Err(err) => {
                    warn!("discarding stored session: {err}");
                    Session::fresh(sid)
                }
            },
            Ok(None) => Session::fresh(sid),
            Err(err) => {
                warn!("token store unavailable during open, starting fresh: {err}");
                Session::fresh(sid)
            }
        }
    }

    /// Persist the session at the end of a request.
    ///
    /// An empty session is deleted from the store; anything else is written
    /// back unconditionally with a freshly computed TTL. The unconditional
    /// write keeps expiry sliding: every request pushes the deadline out,
    /// whether or not the data changed.
    ///
    /// # Errors
    /// Write and delete failures are surfaced; silent data loss on save is
    /// worse than a failed request.
    pub async fn close(&self, session: &Session) -> Result<(), SessionError> {
        let key = self.key_for(session.id());

        if session.is_empty() {
            debug!(sid = session.id(), "deleting empty session");
            self.store.delete(&key).await?;
            return Ok(());
        }

        let bytes = codec::encode(session.data())?;
        let ttl = self.expiration_seconds(session);
        self.store.set(&key, &bytes, ttl).await?;
        Ok(())
    }

    fn key_for(&self, sid: &str) -> String {
        format!("{}{sid}", self.config.key_prefix)
    }

    fn expiration_seconds(&self, session: &Session) -> u64 {
        if session.is_permanent() {
            self.config.permanent_ttl_seconds
        } else {
            self.config.default_ttl_seconds
        }
    }
}

/// Generate a random 128-bit session id, hex-encoded.
fn generate_sid() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
