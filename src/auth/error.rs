// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors of the authenticated request pipeline.

use reqwest::{Response, StatusCode};
use url::Url;

use crate::error::BoxError;

/// A non-2xx response, read to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
    pub status: StatusCode,
    pub url: Url,
    pub body: String,
}

impl FailedResponse {
    pub(crate) async fn read(response: Response) -> Self {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        Self { status, url, body }
    }
}

/// Failure of a request sent through [`AuthClient`](super::AuthClient).
///
/// Non-2xx responses are failures; their status and body are kept.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The server answered with a non-success status
    #[error("request to {} failed with status {}", .0.url, .0.status)]
    Status(FailedResponse),
    /// The request never produced a response
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The refresh function rejected
    #[error("token refresh failed: {0}")]
    Refresh(#[source] BoxError),
    /// The token cannot be encoded as an `Authorization` header value
    #[error("token is not a valid header value")]
    InvalidToken,
}

impl AuthError {
    pub(crate) async fn from_response(response: Response) -> Self {
        AuthError::Status(FailedResponse::read(response).await)
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Status(failed) if failed.status == StatusCode::UNAUTHORIZED => {
                "unauthorized"
            }
            AuthError::Status(_) => "http_status",
            AuthError::Transport(_) => "transport",
            AuthError::Refresh(_) => "refresh_failed",
            AuthError::InvalidToken => "invalid_token",
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            AuthError::Status(failed) => Some(failed.status),
            AuthError::Transport(e) => e.status(),
            AuthError::Refresh(_) | AuthError::InvalidToken => None,
        }
    }

    /// Whether the request ultimately failed with HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The failed response, if the server answered.
    pub fn response(&self) -> Option<&FailedResponse> {
        match self {
            AuthError::Status(failed) => Some(failed),
            _ => None,
        }
    }
}

/// Turn a non-2xx response into [`AuthError::Status`].
pub(crate) async fn check_status(response: Response) -> Result<Response, AuthError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(AuthError::from_response(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: u16) -> AuthError {
        AuthError::Status(FailedResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: Url::parse("http://localhost/protected").unwrap(),
            body: "body".to_string(),
        })
    }

    fn response(status: u16) -> Response {
        let raw = axum::http::Response::builder()
            .status(status)
            .body("expired")
            .unwrap();
        Response::from(raw)
    }

    #[test]
    fn unauthorized_status_has_its_own_code() {
        let err = failed(401);
        assert_eq!(err.error_code(), "unauthorized");
        assert!(err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            "request to http://localhost/protected failed with status 401 Unauthorized"
        );
    }

    #[test]
    fn other_statuses_pass_through() {
        let err = failed(500);
        assert_eq!(err.error_code(), "http_status");
        assert_eq!(err.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!err.is_unauthorized());
        assert_eq!(err.response().unwrap().body, "body");
    }

    #[test]
    fn refresh_failure_keeps_source() {
        let err = AuthError::Refresh("refresh token expired".into());
        assert_eq!(err.error_code(), "refresh_failed");
        assert_eq!(err.status_code(), None);
        assert!(err.response().is_none());
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "refresh token expired");
    }

    #[tokio::test]
    async fn check_status_accepts_success_only() {
        assert!(check_status(response(200)).await.is_ok());
        assert!(check_status(response(204)).await.is_ok());
        assert!(check_status(response(302)).await.is_err());

        let err = check_status(response(401)).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.response().unwrap().body, "expired");
    }
}
