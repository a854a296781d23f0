//! Server-side sessions keyed by an opaque bearer token.
//!
//! A session lives in an external token store as a JSON blob under
//! `prefix + id` with a TTL. The id arrives on the request itself (header or
//! cookie) rather than in a framework cookie jar, which is what lets one
//! bearer token drive both session lookup and authentication.

pub mod codec;
mod interface;
mod session;
pub mod store;

pub use codec::{CodecError, SessionData};
pub use interface::{
    SessionConfig, SessionError, SessionInterface, DEFAULT_KEY_PREFIX,
    DEFAULT_PERMANENT_TTL_SECONDS, DEFAULT_TTL_SECONDS,
};
pub use session::{Session, KEY_AUTH_TOKEN, KEY_IS_AUTHENTICATED, KEY_USER_ID};
pub use store::{MemoryStore, RedisStore, StoreConfig, StoreError, TokenStore};
