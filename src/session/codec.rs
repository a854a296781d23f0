//! Session payload codec.
//!
//! Session data is a flat map of string keys to JSON-serializable values and
//! is stored as a JSON object. Anything that does not decode back into an
//! object is reported as corrupt; the session interface treats that the same
//! as a cache miss.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// The session payload: string keys mapped to scalar/JSON values.
pub type SessionData = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("corrupt or incompatible session payload: {0}")]
    Decode(String),
    #[error("failed to encode session payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Serialize session data for the token store.
///
/// # Errors
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode(data: &SessionData) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(data)?)
}

/// Deserialize stored bytes back into session data.
///
/// # Errors
/// Returns `CodecError::Decode` for anything other than a JSON object.
pub fn decode(bytes: &[u8]) -> Result<SessionData, CodecError> {
    serde_json::from_slice(bytes).map_err(|err| CodecError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_session_data() {
        let mut data = SessionData::new();
        data.insert("is_authenticated".to_string(), json!(true));
        data.insert("auth_token".to_string(), json!("abc123"));
        data.insert("cart_items".to_string(), json!(3));

        let bytes = encode(&data).unwrap();
        assert_eq!(decode(&bytes).unwrap(), data);
    }

    #[test]
    fn rejects_corrupt_bytes() {
        assert!(matches!(
            decode(b"\x80\x04not json"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn rejects_non_object_payload() {
        assert!(matches!(decode(b"[1,2,3]"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn empty_object_decodes_to_empty_data() {
        assert!(decode(b"{}").unwrap().is_empty());
    }
}
