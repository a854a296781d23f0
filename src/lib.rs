//! # Easyauth (token-keyed sessions and bearer-token auth)
//!
//! `easyauth` is a pluggable authentication layer for axum services. It
//! issues and validates opaque bearer tokens, binds them to a server-side
//! session store, and gates handlers on the resolved identity's role.
//!
//! ## Session model
//!
//! Sessions live in an external token store (Redis) as JSON blobs keyed by
//! `prefix + id` with TTL-based, sliding expiry. The id is the bearer token
//! presented on the request itself (a configured header or cookie) rather
//! than a framework cookie jar, so one token drives both session lookup and
//! authentication.
//!
//! ## Authentication
//!
//! Logging in mints a random 128-bit hex token and persists an auth token
//! record mapping it to the user; that record is the source of truth for
//! "is this token currently valid". Logging out deletes the record and
//! empties the session, which deletes the stored blob at request close.
//!
//! ## Authorization
//!
//! Guards are pure predicates over the resolved identity. The `admin` user
//! type bypasses explicit role lists, but is never sufficient on its own:
//! every guard requires an authenticated identity first. Denials answer with
//! one fixed 401 JSON payload and no internal detail.

pub mod api;
pub mod auth;
pub mod cli;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
