// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: a local mock API and scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{BoxFuture, TokenRefresher};
use crate::error::BoxError;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Profile {
    pub email: String,
    pub role: String,
}

pub(crate) fn profile() -> Profile {
    Profile {
        email: "test@example.com".to_string(),
        role: "admin".to_string(),
    }
}

/// Mock API that accepts exactly one bearer token and records every
/// `Authorization` header it sees.
#[derive(Clone, Default)]
pub(crate) struct MockApi {
    valid_token: Arc<Mutex<String>>,
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockApi {
    pub(crate) fn accepting(token: &str) -> Self {
        let api = Self::default();
        *api.valid_token.lock().unwrap() = token.to_string();
        api
    }

    /// Authorization headers received so far, in order.
    pub(crate) fn seen(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn record(&self, headers: &HeaderMap) -> bool {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        let authorized = header.as_deref() == Some(expected.as_str());
        self.seen.lock().unwrap().push(header);
        authorized
    }

    pub(crate) async fn serve(&self) -> String {
        let router = Router::new()
            .route("/protected", get(protected))
            .route("/me", get(me))
            .route("/broken", get(broken))
            .with_state(self.clone());
        spawn_server(router).await
    }
}

async fn protected(State(api): State<MockApi>, headers: HeaderMap) -> (StatusCode, &'static str) {
    if api.record(&headers) {
        (StatusCode::OK, "secret data")
    } else {
        (StatusCode::UNAUTHORIZED, "expired")
    }
}

async fn me(
    State(api): State<MockApi>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if api.record(&headers) {
        Ok(Json(json!({"email": "test@example.com", "role": "admin"})))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn broken(State(api): State<MockApi>, headers: HeaderMap) -> StatusCode {
    api.record(&headers);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Refresher that replays a fixed script of outcomes, then "cannot refresh".
///
/// Clones share the script and the call counter.
#[derive(Clone, Default)]
pub(crate) struct ScriptedRefresher {
    script: Arc<Mutex<VecDeque<Result<Option<String>, String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRefresher {
    pub(crate) fn new(
        script: impl IntoIterator<Item = Result<Option<&'static str>, &'static str>>,
    ) -> Self {
        let script = script
            .into_iter()
            .map(|step| {
                step.map(|token| token.map(str::to_string))
                    .map_err(str::to_string)
            })
            .collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenRefresher for ScriptedRefresher {
    fn refresh(&self) -> BoxFuture<'_, Result<Option<String>, BoxError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Ok(None));
        Box::pin(async move { step.map_err(BoxError::from) })
    }
}
