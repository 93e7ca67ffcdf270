// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Profile Loader
//!
//! Background task that keeps the current user's profile in step with the
//! session token.
//!
//! ## Strategy
//!
//! On every token transition:
//! 1. Token absent: the state is reset to (no data, not loading, no error)
//!    without calling the fetcher.
//! 2. Token present: the state is marked loading and the loader calls the
//!    [`UserFetcher`]. Success stores the profile; any failure stores the
//!    fixed [`FETCH_USER_FAILED`] message.
//!
//! The reset and the loading flag are applied by a store hook inside
//! [`TokenStore::set`](crate::TokenStore::set), so they are visible as soon
//! as the token write returns. Only the fetch itself runs on the task.
//!
//! If the token changes while a fetch is in flight, that fetch is dropped and
//! the loader starts over for the new value. A result is only ever written
//! while the token it was requested with is still current.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`; nothing is written after the
//! session is torn down.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthClient, BearerToken, BoxFuture};
use crate::error::BoxError;

/// Error message stored when the profile cannot be fetched.
pub const FETCH_USER_FAILED: &str = "Failed to fetch user";

/// Derived view state of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState<U> {
    pub data: Option<U>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<U> Default for UserState<U> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<U> UserState<U> {
    fn from_result(result: Result<U, BoxError>) -> Self {
        match result {
            Ok(user) => Self {
                data: Some(user),
                loading: false,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "User profile fetch failed");
                Self {
                    data: None,
                    loading: false,
                    error: Some(FETCH_USER_FAILED.to_string()),
                }
            }
        }
    }
}

/// Fetches the current user's profile.
///
/// Receives the session's [`AuthClient`], so profile requests carry the
/// bearer token and get the 401 refresh policy.
pub trait UserFetcher<U>: Send + Sync {
    fn fetch_user<'a>(&'a self, client: &'a AuthClient) -> BoxFuture<'a, Result<U, BoxError>>;
}

impl<U, F, Fut> UserFetcher<U> for F
where
    F: Fn(AuthClient) -> Fut + Send + Sync,
    Fut: Future<Output = Result<U, BoxError>> + Send + 'static,
{
    fn fetch_user<'a>(&'a self, client: &'a AuthClient) -> BoxFuture<'a, Result<U, BoxError>> {
        Box::pin(self(client.clone()))
    }
}

/// Fetcher that `GET`s a JSON profile endpoint through the session client.
pub struct HttpUserFetcher<U> {
    url: Url,
    _user: PhantomData<fn() -> U>,
}

impl<U> HttpUserFetcher<U> {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            _user: PhantomData,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl<U> Clone for HttpUserFetcher<U> {
    fn clone(&self) -> Self {
        Self::new(self.url.clone())
    }
}

impl<U> UserFetcher<U> for HttpUserFetcher<U>
where
    U: DeserializeOwned + Send + 'static,
{
    fn fetch_user<'a>(&'a self, client: &'a AuthClient) -> BoxFuture<'a, Result<U, BoxError>> {
        Box::pin(async move {
            let response = client.send(client.get(self.url.clone())).await?;
            let user = response.json::<U>().await?;
            Ok::<_, BoxError>(user)
        })
    }
}

/// Background task driving [`UserState`] from token transitions.
pub(crate) struct ProfileLoader<U> {
    fetcher: Arc<dyn UserFetcher<U>>,
    client: AuthClient,
    tokens: watch::Receiver<Option<BearerToken>>,
    state: Arc<watch::Sender<UserState<U>>>,
}

impl<U> ProfileLoader<U>
where
    U: Clone + Send + Sync + 'static,
{
    /// Creates the loader and hooks the reset and loading transitions into
    /// the token store, so they land together with the token write.
    pub(crate) fn new(
        fetcher: Arc<dyn UserFetcher<U>>,
        client: AuthClient,
        state: Arc<watch::Sender<UserState<U>>>,
        shutdown: &CancellationToken,
    ) -> Self {
        let store = client.store();
        let tokens = store.subscribe();

        if store.is_present() {
            state.send_modify(|s| s.loading = true);
        }

        let user = Arc::downgrade(&state);
        let shutdown = shutdown.clone();
        store.on_transition(move |token| {
            if shutdown.is_cancelled() {
                return;
            }
            let Some(user) = user.upgrade() else {
                return;
            };
            match token {
                Some(_) => user.send_modify(|s| s.loading = true),
                None => {
                    user.send_replace(UserState::default());
                }
            }
        });

        Self {
            fetcher,
            client,
            tokens,
            state,
        }
    }

    /// Run the loader until the cancellation token is triggered or the
    /// token store goes away.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(loader.run(shutdown.clone()));
    /// ```
    pub(crate) async fn run(mut self, shutdown: CancellationToken) {
        debug!("User profile loader starting");

        loop {
            let issued = self.tokens.borrow_and_update().clone();

            if let Some(issued) = issued {
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    changed = self.tokens.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!("Token changed during profile fetch; discarding in-flight fetch");
                        continue;
                    }
                    result = self.fetcher.fetch_user(&self.client) => {
                        if shutdown.is_cancelled() {
                            break;
                        }
                        self.commit(&issued, UserState::from_result(result));
                    }
                }
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                changed = self.tokens.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("User profile loader shutting down");
    }

    /// Write a fetch result if the token is still the one it was fetched for.
    ///
    /// The token stays read-locked across the write, so a concurrent
    /// transition either lands before the check or resets afterwards.
    fn commit(&self, issued: &BearerToken, next: UserState<U>) {
        let current = self.tokens.borrow();
        if current.as_ref() != Some(issued) {
            debug!("Token changed before profile result landed; discarding it");
            return;
        }
        self.state.send_replace(next);
    }
}
