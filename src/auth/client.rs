// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated HTTP client.
//!
//! Wraps a `reqwest::Client` with the two session interceptors:
//!
//! 1. **Request**: attach `Authorization: Bearer <token>` from the live store
//!    at send time (headers untouched when no token is held).
//! 2. **Response**: on HTTP 401, refresh the token once, store it and replay
//!    the original request with the new token. A replayed request that fails
//!    again is never refreshed a second time.
//!
//! Once the owning session is torn down the interceptors are detached:
//! requests go out as-is and 401s are returned without a refresh.

use std::sync::Arc;

use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use url::Url;
use uuid::Uuid;

use super::error::{check_status, AuthError};
use super::refresh::TokenRefresher;
use super::store::TokenStore;
use super::token::{authorize, BearerToken};

/// Per-request retry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryState {
    NotRetried,
    Retried,
}

/// What to do with a received response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// Hand the response (or its failure) to the caller
    PassThrough,
    /// Refresh the token and replay the request
    Refresh,
}

impl RetryState {
    pub(crate) fn on_response(self, status: StatusCode) -> RetryDecision {
        match (self, status) {
            (RetryState::NotRetried, StatusCode::UNAUTHORIZED) => RetryDecision::Refresh,
            _ => RetryDecision::PassThrough,
        }
    }
}

/// HTTP client bound to a session's token store.
///
/// Cheap to clone; clones share the store and the refresher.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    store: TokenStore,
    refresher: Arc<dyn TokenRefresher>,
    shutdown: CancellationToken,
}

impl AuthClient {
    pub(crate) fn new(
        http: Client,
        store: TokenStore,
        refresher: Arc<dyn TokenRefresher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            http,
            store,
            refresher,
            shutdown,
        }
    }

    /// The underlying client, for building requests.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// The token store this client reads from.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Whether the owning session has been torn down.
    pub fn is_detached(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Start a request; send it with [`AuthClient::send`].
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Start a `GET` request.
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a `POST` request.
    pub fn post(&self, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Build and send a request through the interceptors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, AuthError> {
        self.execute(builder.build()?).await
    }

    /// Send a request through the interceptors.
    ///
    /// Resolves with the 2xx response, or fails with the final non-2xx
    /// response, the transport error, or the refresh rejection.
    pub async fn execute(&self, request: Request) -> Result<Response, AuthError> {
        let span = tracing::debug_span!(
            "auth_request",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            url = %request.url(),
        );

        async move {
            if self.is_detached() {
                debug!("Session closed; sending without credentials");
                return check_status(self.http.execute(request).await?).await;
            }
            self.dispatch(request).await
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, mut request: Request) -> Result<Response, AuthError> {
        if let Some(token) = self.store.get() {
            authorize(&mut request, &token)?;
        }

        let mut state = RetryState::NotRetried;
        loop {
            let replay = request.try_clone();
            let response = self.http.execute(request).await?;

            match state.on_response(response.status()) {
                RetryDecision::PassThrough => return check_status(response).await,
                RetryDecision::Refresh => {}
            }
            state = RetryState::Retried;

            let Some(mut next) = replay else {
                warn!("Request body cannot be replayed; returning 401 without refresh");
                return Err(AuthError::from_response(response).await);
            };

            info!("Received 401, refreshing token");
            let Some(token) = self.refresh_token().await? else {
                debug!("Refresh produced no token; returning original 401");
                return Err(AuthError::from_response(response).await);
            };

            authorize(&mut next, &token)?;
            request = next;
        }
    }

    /// Run the refresh function and store its result.
    ///
    /// A rejection leaves the stored token unchanged. After teardown the
    /// result is returned but not stored.
    pub async fn refresh_token(&self) -> Result<Option<BearerToken>, AuthError> {
        let raw = self.refresher.refresh().await.map_err(|e| {
            warn!(error = %e, "Token refresh failed");
            AuthError::Refresh(e)
        })?;
        let token = raw.and_then(BearerToken::new);

        if self.is_detached() {
            debug!("Session closed during refresh; token not stored");
            return Ok(token);
        }

        self.store.set(token.clone());
        Ok(token)
    }
}
