// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session
//!
//! The session wires the token store, the authenticated client and the
//! profile loader together for one root scope.
//!
//! ## Lifecycle
//!
//! 1. [`SessionBuilder::start`] creates the store, spawns the profile loader
//!    and (unless disabled) spawns the initial token refresh
//! 2. The application reads view state, signs in/out, refreshes and sends
//!    requests through [`Session::client`]
//! 3. [`Session::close`] (or drop) tears everything down; outstanding
//!    [`SessionHandle`]s then fail with [`SessionError::OutsideSession`]
//!
//! Requires a Tokio runtime.

use std::sync::{Arc, Weak};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::{
    AuthClient, AuthError, BearerToken, HttpTokenRefresher, TokenRefresher, TokenStore,
};
use crate::config::{ConfigError, SessionConfig, PROFILE_URL_ENV, REFRESH_URL_ENV};
use crate::error::SessionError;
use crate::profile::{HttpUserFetcher, ProfileLoader, UserFetcher, UserState};

struct SessionInner<U> {
    client: AuthClient,
    user: Arc<watch::Sender<UserState<U>>>,
    shutdown: CancellationToken,
}

impl<U> SessionInner<U> {
    fn store(&self) -> &TokenStore {
        self.client.store()
    }

    fn sign_in(&self, token: String) {
        debug!("Signing in");
        self.store().set(BearerToken::new(token));
    }

    fn sign_out(&self) {
        debug!("Signing out");
        self.store().set(None);
    }
}

/// Configures and starts a [`Session`].
pub struct SessionBuilder<U> {
    refresher: Arc<dyn TokenRefresher>,
    fetcher: Arc<dyn UserFetcher<U>>,
    http: Option<Client>,
    initial_token: Option<BearerToken>,
    refresh_on_start: bool,
}

impl<U> SessionBuilder<U>
where
    U: Clone + Send + Sync + 'static,
{
    pub fn new(
        refresher: impl TokenRefresher + 'static,
        fetcher: impl UserFetcher<U> + 'static,
    ) -> Self {
        Self {
            refresher: Arc::new(refresher),
            fetcher: Arc::new(fetcher),
            http: None,
            initial_token: None,
            refresh_on_start: true,
        }
    }

    /// Use this client for API requests instead of a default one.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Seed the store before the session starts.
    pub fn initial_token(mut self, token: impl Into<String>) -> Self {
        self.initial_token = BearerToken::new(token);
        self
    }

    /// Whether to call the refresher once when the session starts (default `true`).
    pub fn refresh_on_start(mut self, enabled: bool) -> Self {
        self.refresh_on_start = enabled;
        self
    }

    /// Start the session.
    ///
    /// Spawns the profile loader and, unless disabled, the initial refresh.
    pub fn start(self) -> Session<U> {
        let shutdown = CancellationToken::new();
        let store = TokenStore::new(self.initial_token);
        let client = AuthClient::new(
            self.http.unwrap_or_default(),
            store,
            self.refresher,
            shutdown.clone(),
        );

        let (user, _rx) = watch::channel(UserState::default());
        let user = Arc::new(user);

        let loader = ProfileLoader::new(self.fetcher, client.clone(), user.clone(), &shutdown);
        tokio::spawn(loader.run(shutdown.clone()));

        if self.refresh_on_start {
            tokio::spawn(initial_refresh(client.clone(), shutdown.clone()));
        }

        info!(refresh_on_start = self.refresh_on_start, "Session started");
        Session {
            inner: Arc::new(SessionInner {
                client,
                user,
                shutdown,
            }),
        }
    }
}

/// Establish the first token. Failures are logged, never stored.
async fn initial_refresh(client: AuthClient, shutdown: CancellationToken) {
    tokio::select! {
        () = shutdown.cancelled() => {}
        result = client.refresh_token() => match result {
            Ok(token) => debug!(present = token.is_some(), "Initial token refresh finished"),
            Err(e) => warn!(error = %e, "Initial token refresh failed"),
        },
    }
}

/// An authentication session owned by one root scope.
///
/// Dropping the session tears it down.
pub struct Session<U> {
    inner: Arc<SessionInner<U>>,
}

impl<U> Session<U>
where
    U: Clone + Send + Sync + 'static,
{
    pub fn builder(
        refresher: impl TokenRefresher + 'static,
        fetcher: impl UserFetcher<U> + 'static,
    ) -> SessionBuilder<U> {
        SessionBuilder::new(refresher, fetcher)
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<BearerToken> {
        self.inner.store().get()
    }

    /// `true` iff a non-empty token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.store().is_present()
    }

    /// Snapshot of the current user state.
    pub fn current_user(&self) -> UserState<U> {
        self.inner.user.borrow().clone()
    }

    /// Set the token directly, bypassing refresh.
    pub fn sign_in(&self, token: impl Into<String>) {
        self.inner.sign_in(token.into());
    }

    /// Clear the token.
    pub fn sign_out(&self) {
        self.inner.sign_out();
    }

    /// Run the refresh flow now and store its result.
    pub async fn refresh(&self) -> Result<Option<BearerToken>, AuthError> {
        self.inner.client.refresh_token().await
    }

    /// Client that sends requests with the session token.
    pub fn client(&self) -> &AuthClient {
        &self.inner.client
    }

    /// Subscribe to token transitions.
    pub fn subscribe_token(&self) -> watch::Receiver<Option<BearerToken>> {
        self.inner.store().subscribe()
    }

    /// Subscribe to user state changes.
    pub fn subscribe_user(&self) -> watch::Receiver<UserState<U>> {
        self.inner.user.subscribe()
    }

    /// A weak handle for passing to UI components.
    pub fn handle(&self) -> SessionHandle<U> {
        SessionHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Tear the session down.
    pub fn close(self) {
        drop(self);
    }
}

impl<U> Session<U>
where
    U: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Builder wired with the HTTP refresher and profile fetcher from `config`.
    pub fn from_config(config: &SessionConfig) -> Result<SessionBuilder<U>, ConfigError> {
        let refresh_url = config
            .refresh_url
            .clone()
            .ok_or(ConfigError::Missing(REFRESH_URL_ENV))?;
        let profile_url = config
            .profile_url
            .clone()
            .ok_or(ConfigError::Missing(PROFILE_URL_ENV))?;
        let http = config.http_client()?;

        Ok(SessionBuilder::new(
            HttpTokenRefresher::new(http.clone(), refresh_url),
            HttpUserFetcher::<U>::new(profile_url),
        )
        .http_client(http)
        .refresh_on_start(config.refresh_on_start))
    }
}

impl<U> Drop for Session<U> {
    fn drop(&mut self) {
        if !self.inner.shutdown.is_cancelled() {
            self.inner.shutdown.cancel();
            info!("Session closed");
        }
    }
}

/// Weak, clonable access to a [`Session`].
///
/// Every operation fails with [`SessionError::OutsideSession`] once the
/// session has been torn down.
pub struct SessionHandle<U> {
    inner: Weak<SessionInner<U>>,
}

impl<U> Clone for SessionHandle<U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<U> SessionHandle<U>
where
    U: Clone + Send + Sync + 'static,
{
    fn session(&self) -> Result<Arc<SessionInner<U>>, SessionError> {
        let inner = self.inner.upgrade().ok_or(SessionError::OutsideSession)?;
        if inner.shutdown.is_cancelled() {
            return Err(SessionError::OutsideSession);
        }
        Ok(inner)
    }

    pub fn token(&self) -> Result<Option<BearerToken>, SessionError> {
        Ok(self.session()?.store().get())
    }

    pub fn is_authenticated(&self) -> Result<bool, SessionError> {
        Ok(self.session()?.store().is_present())
    }

    pub fn current_user(&self) -> Result<UserState<U>, SessionError> {
        Ok(self.session()?.user.borrow().clone())
    }

    pub fn sign_in(&self, token: impl Into<String>) -> Result<(), SessionError> {
        self.session()?.sign_in(token.into());
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.session()?.sign_out();
        Ok(())
    }

    pub async fn refresh(&self) -> Result<Option<BearerToken>, SessionError> {
        let client = self.session()?.client.clone();
        Ok(client.refresh_token().await?)
    }

    pub fn client(&self) -> Result<AuthClient, SessionError> {
        Ok(self.session()?.client.clone())
    }
}
