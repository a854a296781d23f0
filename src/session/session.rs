//! Per-request session object with dirty tracking.

use crate::session::codec::SessionData;
use serde_json::Value;

/// Session key for the authenticated flag.
pub const KEY_IS_AUTHENTICATED: &str = "is_authenticated";
/// Session key holding the active bearer token.
pub const KEY_AUTH_TOKEN: &str = "auth_token";
/// Session key holding the remembered user id.
pub const KEY_USER_ID: &str = "user_id";

/// One client's session state for the duration of one request.
///
/// Built by [`SessionInterface::open`](crate::session::SessionInterface::open)
/// at request-open time, mutated by handlers and the auth core, persisted or
/// deleted at request-close time, then discarded. Every mutation marks the
/// session dirty.
#[derive(Debug)]
pub struct Session {
    id: String,
    data: SessionData,
    is_new: bool,
    is_dirty: bool,
    is_permanent: bool,
}

impl Session {
    /// A session with no stored record behind it. The id may be freshly
    /// generated or reused from the request when the store had no hit.
    #[must_use]
    pub(crate) fn fresh(id: String) -> Self {
        Self {
            id,
            data: SessionData::new(),
            is_new: true,
            is_dirty: false,
            is_permanent: false,
        }
    }

    /// A session restored from stored bytes.
    #[must_use]
    pub(crate) fn restored(id: String, data: SessionData) -> Self {
        Self {
            id,
            data,
            is_new: false,
            is_dirty: false,
            is_permanent: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.is_permanent
    }

    pub fn set_permanent(&mut self, permanent: bool) {
        self.is_permanent = permanent;
        self.is_dirty = true;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.is_dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        self.is_dirty = true;
        removed
    }

    /// Drop every key. An empty session is deleted from the store at close
    /// time instead of written back.
    pub fn clear(&mut self) {
        self.data.clear();
        self.is_dirty = true;
    }

    /// Whether the session has been marked authenticated. A missing flag
    /// reads as unauthenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.data
            .get(KEY_IS_AUTHENTICATED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The bearer token bound to this session, if any. A null value reads
    /// the same as a missing key.
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.data
            .get(KEY_AUTH_TOKEN)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The user id remembered by a previous login, if any.
    #[must_use]
    pub fn remembered_user_id(&self) -> Option<String> {
        self.data
            .get(KEY_USER_ID)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Bind a live bearer token to this session.
    pub fn mark_authenticated(&mut self, token: &str) {
        self.insert(KEY_IS_AUTHENTICATED, Value::Bool(true));
        self.insert(KEY_AUTH_TOKEN, Value::String(token.to_string()));
    }

    /// Remember which user this session belongs to.
    pub fn remember_user(&mut self, user_id: &str) {
        self.insert(KEY_USER_ID, Value::String(user_id.to_string()));
    }

    /// Remove the auth keys. Absent keys read as unauthenticated, so removal
    /// is the reset; it also keeps a logged-out session empty, which makes
    /// the close path delete the stored record.
    pub fn reset_auth(&mut self) {
        self.remove(KEY_IS_AUTHENTICATED);
        self.remove(KEY_AUTH_TOKEN);
        self.remove(KEY_USER_ID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_session_is_new_and_clean() {
        let session = Session::fresh("abc".to_string());
        assert!(session.is_new());
        assert!(!session.is_dirty());
        assert!(!session.is_permanent());
        assert!(session.is_empty());
        assert_eq!(session.id(), "abc");
    }

    #[test]
    fn restored_session_is_not_new() {
        let mut data = SessionData::new();
        data.insert("cart_items".to_string(), json!(2));
        let session = Session::restored("abc".to_string(), data);
        assert!(!session.is_new());
        assert!(!session.is_dirty());
        assert_eq!(session.get("cart_items"), Some(&json!(2)));
    }

    #[test]
    fn every_mutation_marks_dirty() {
        let mut session = Session::fresh("abc".to_string());
        session.insert("k", json!(1));
        assert!(session.is_dirty());

        let mut session = Session::fresh("abc".to_string());
        session.remove("missing");
        assert!(session.is_dirty());

        let mut session = Session::fresh("abc".to_string());
        session.clear();
        assert!(session.is_dirty());

        let mut session = Session::fresh("abc".to_string());
        session.set_permanent(true);
        assert!(session.is_dirty());
        assert!(session.is_permanent());
    }

    #[test]
    fn reads_do_not_mark_dirty() {
        let session = Session::fresh("abc".to_string());
        let _ = session.get("k");
        let _ = session.is_authenticated();
        let _ = session.auth_token();
        let _ = session.is_empty();
        assert!(!session.is_dirty());
    }

    #[test]
    fn auth_helpers_read_well_known_keys() {
        let mut session = Session::fresh("abc".to_string());
        assert!(!session.is_authenticated());
        assert_eq!(session.auth_token(), None);

        session.mark_authenticated("deadbeef");
        assert!(session.is_authenticated());
        assert_eq!(session.auth_token(), Some("deadbeef".to_string()));

        session.remember_user("u1");
        assert_eq!(session.remembered_user_id(), Some("u1".to_string()));
    }

    #[test]
    fn null_auth_token_reads_as_none() {
        let mut session = Session::fresh("abc".to_string());
        session.insert(KEY_AUTH_TOKEN, Value::Null);
        assert_eq!(session.auth_token(), None);
    }

    #[test]
    fn reset_auth_leaves_session_empty_after_clear() {
        let mut session = Session::fresh("abc".to_string());
        session.mark_authenticated("deadbeef");
        session.remember_user("u1");
        session.reset_auth();
        assert!(!session.is_authenticated());
        assert_eq!(session.auth_token(), None);
        assert_eq!(session.remembered_user_id(), None);
        assert!(session.is_empty());
    }
}
