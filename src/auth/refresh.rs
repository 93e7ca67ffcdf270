// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token refresh collaborator.
//!
//! The session never decides how a token is obtained. The embedding
//! application supplies a [`TokenRefresher`]: either a closure returning a
//! future, or [`HttpTokenRefresher`] for a plain JSON refresh endpoint.
//!
//! Resolving to `Ok(None)` means "cannot refresh" (e.g. the refresh token has
//! expired too). An `Err` is a rejection and is surfaced to whoever triggered
//! the refresh.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::BoxError;

/// Boxed, sendable future used at the collaborator seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Obtains a new raw token from an external authority.
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self) -> BoxFuture<'_, Result<Option<String>, BoxError>>;
}

impl<F, Fut> TokenRefresher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    fn refresh(&self) -> BoxFuture<'_, Result<Option<String>, BoxError>> {
        Box::pin(self())
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Older endpoints answer with `token`; `access_token` wins when both are set.
    #[serde(default)]
    token: Option<String>,
}

impl RefreshResponse {
    fn into_token(self) -> Option<String> {
        self.access_token.or(self.token)
    }
}

/// Refresher that `POST`s to a refresh endpoint and reads `access_token`.
///
/// - 2xx with `{"access_token": "..."}` (or `{"token": "..."}`) → token
/// - 2xx with a null/missing token, 401, 403 → cannot refresh
/// - anything else → error
///
/// Uses a plain client so a refresh can never trigger another refresh.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: Client,
    url: Url,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    /// Get the refresh endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch_token(&self) -> Result<Option<String>, BoxError> {
        let response = self.http.post(self.url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(%status, "Refresh endpoint refused to issue a token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(format!("HTTP {status} from refresh endpoint").into());
        }

        let body: RefreshResponse = response.json().await?;
        Ok(body.into_token())
    }
}

impl TokenRefresher for HttpTokenRefresher {
    fn refresh(&self) -> BoxFuture<'_, Result<Option<String>, BoxError>> {
        Box::pin(self.fetch_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::json;

    fn refresher(base: &str, path: &str) -> HttpTokenRefresher {
        let url = Url::parse(base).unwrap().join(path).unwrap();
        HttpTokenRefresher::new(Client::new(), url)
    }

    #[tokio::test]
    async fn closures_are_refreshers() {
        let refresher = || async { Ok::<_, BoxError>(Some("from-closure".to_string())) };
        assert_eq!(
            refresher.refresh().await.unwrap().as_deref(),
            Some("from-closure")
        );
    }

    #[tokio::test]
    async fn reads_access_token_and_alias() {
        let base = spawn_server(
            Router::new()
                .route("/refresh", post(|| async { Json(json!({"access_token": "fresh"})) }))
                .route("/legacy", post(|| async { Json(json!({"token": "old-style"})) }))
                .route("/null", post(|| async { Json(json!({"access_token": null})) }))
                .route(
                    "/both",
                    post(|| async { Json(json!({"access_token": "new", "token": "old"})) }),
                ),
        )
        .await;

        let token = refresher(&base, "/refresh").refresh().await.unwrap();
        assert_eq!(token.as_deref(), Some("fresh"));

        let token = refresher(&base, "/legacy").refresh().await.unwrap();
        assert_eq!(token.as_deref(), Some("old-style"));

        let token = refresher(&base, "/null").refresh().await.unwrap();
        assert!(token.is_none());

        let token = refresher(&base, "/both").refresh().await.unwrap();
        assert_eq!(token.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn unauthorized_means_cannot_refresh() {
        let base = spawn_server(
            Router::new()
                .route("/refresh", post(|| async { AxumStatus::UNAUTHORIZED }))
                .route("/forbidden", post(|| async { AxumStatus::FORBIDDEN })),
        )
        .await;

        assert!(refresher(&base, "/refresh").refresh().await.unwrap().is_none());
        assert!(refresher(&base, "/forbidden").refresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_errors_reject() {
        let base = spawn_server(
            Router::new().route("/refresh", post(|| async { AxumStatus::BAD_GATEWAY })),
        )
        .await;

        let err = refresher(&base, "/refresh").refresh().await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
