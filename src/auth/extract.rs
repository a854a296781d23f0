//! Bearer token extraction from incoming requests.
//!
//! Exactly one extraction mode is selected at initialization: a dedicated
//! header or a cookie. Both the session interface and the identity resolver
//! go through [`extract_request_token`], so a request is always read the
//! same way.

use crate::auth::AuthError;
use axum::http::{header::COOKIE, HeaderMap};

/// Header carrying the bearer token in header mode.
pub const TOKEN_HEADER: &str = "Authentication-Token";
/// Cookie carrying the bearer token in cookie mode.
pub const TOKEN_COOKIE: &str = "AuthenticationToken";

/// Where to look for the bearer token on a request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExtractionMode {
    #[default]
    Header,
    Cookie,
}

impl ExtractionMode {
    /// Parse the configured mode name.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidConfiguration` for anything other than
    /// `header` or `cookie`.
    pub fn parse(mode: &str) -> Result<Self, AuthError> {
        match mode.to_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            other => Err(AuthError::InvalidConfiguration(format!(
                "unknown token extraction mode: {other}"
            ))),
        }
    }
}

/// Pull the bearer token off a request, if present.
#[must_use]
pub fn extract_request_token(mode: ExtractionMode, headers: &HeaderMap) -> Option<String> {
    match mode {
        ExtractionMode::Header => headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string),
        ExtractionMode::Cookie => extract_cookie_token(headers),
    }
}

fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
            continue;
        };
        if key.trim() == TOKEN_COOKIE && !val.trim().is_empty() {
            return Some(val.trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_accepts_known_modes() {
        assert_eq!(
            ExtractionMode::parse("header").unwrap(),
            ExtractionMode::Header
        );
        assert_eq!(
            ExtractionMode::parse("Cookie").unwrap(),
            ExtractionMode::Cookie
        );
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert!(matches!(
            ExtractionMode::parse("query"),
            Err(AuthError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn header_mode_reads_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(
            extract_request_token(ExtractionMode::Header, &headers),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn header_mode_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("  "));
        assert_eq!(extract_request_token(ExtractionMode::Header, &headers), None);
    }

    #[test]
    fn header_mode_ignores_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("AuthenticationToken=abc123"),
        );
        assert_eq!(extract_request_token(ExtractionMode::Header, &headers), None);
    }

    #[test]
    fn cookie_mode_reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; AuthenticationToken=abc123; lang=en"),
        );
        assert_eq!(
            extract_request_token(ExtractionMode::Cookie, &headers),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn cookie_mode_skips_flag_style_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("secure; AuthenticationToken=abc123"),
        );
        assert_eq!(
            extract_request_token(ExtractionMode::Cookie, &headers),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn cookie_mode_ignores_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_request_token(ExtractionMode::Cookie, &headers), None);
    }

    #[test]
    fn missing_headers_yield_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_request_token(ExtractionMode::Header, &headers), None);
        assert_eq!(extract_request_token(ExtractionMode::Cookie, &headers), None);
    }
}
