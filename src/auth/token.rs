// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token value.
//!
//! Tokens are opaque: no shape validation beyond "empty means absent".
//! The secret is never printed by `Debug` or `Display`.

use std::fmt;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

use super::error::AuthError;

/// An opaque, non-empty bearer credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    ///
    /// Returns `None` for an empty string, which is treated as "no token".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Build the `Authorization` header value (`Bearer <token>`), marked sensitive.
    pub fn header_value(&self) -> Result<HeaderValue, AuthError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))
            .map_err(|_| AuthError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Set `Authorization: Bearer <token>` on a request, replacing any existing value.
pub(crate) fn authorize(request: &mut Request, token: &BearerToken) -> Result<(), AuthError> {
    request
        .headers_mut()
        .insert(AUTHORIZATION, token.header_value()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_absent() {
        assert!(BearerToken::new("").is_none());
        assert_eq!(BearerToken::new("abc").unwrap().expose(), "abc");
    }

    #[test]
    fn debug_and_display_redact_secret() {
        let token = BearerToken::new("super-secret").unwrap();
        assert!(!format!("{token:?}").contains("super-secret"));
        assert_eq!(token.to_string(), "<redacted>");
    }

    #[test]
    fn header_value_uses_bearer_scheme() {
        let token = BearerToken::new("token123").unwrap();
        let value = token.header_value().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer token123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn control_characters_are_rejected() {
        let token = BearerToken::new("bad\ntoken").unwrap();
        assert!(matches!(token.header_value(), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn authorize_replaces_existing_header() {
        let client = reqwest::Client::new();
        let mut request = client
            .get("http://localhost/")
            .header(AUTHORIZATION, "Bearer stale")
            .build()
            .unwrap();
        authorize(&mut request, &BearerToken::new("fresh").unwrap()).unwrap();

        let values: Vec<_> = request.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), "Bearer fresh");
    }
}
