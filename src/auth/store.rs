// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory token store with change notification.
//!
//! The store is the single owner of the session token. Readers take a snapshot
//! with [`TokenStore::get`]; dependents that react to transitions (the profile
//! loader, UI bindings) hold a `watch` subscription. State that must never
//! disagree with the token registers a [`TokenStore::on_transition`] hook,
//! which runs inside [`TokenStore::set`] before it returns.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::debug;

use super::token::BearerToken;

type TransitionHook = Box<dyn Fn(Option<&BearerToken>) + Send + Sync>;

struct Shared {
    tx: watch::Sender<Option<BearerToken>>,
    hooks: RwLock<Vec<TransitionHook>>,
}

/// Shared, clonable handle to the session token.
#[derive(Clone)]
pub struct TokenStore {
    shared: Arc<Shared>,
}

impl TokenStore {
    /// Create a store holding `initial`.
    pub fn new(initial: Option<BearerToken>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                tx,
                hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<BearerToken> {
        self.shared.tx.borrow().clone()
    }

    /// Whether a token is currently held.
    pub fn is_present(&self) -> bool {
        self.shared.tx.borrow().is_some()
    }

    /// Replace the token.
    ///
    /// Subscribers are notified only when the value actually changes.
    /// Returns `true` if it did.
    pub fn set(&self, token: Option<BearerToken>) -> bool {
        let changed = self.shared.tx.send_if_modified(|current| {
            if *current == token {
                return false;
            }
            *current = token;

            let hooks = self.shared.hooks.read().unwrap_or_else(PoisonError::into_inner);
            for hook in hooks.iter() {
                hook(current.as_ref());
            }
            true
        });

        if changed {
            debug!(present = self.is_present(), "Session token changed");
        }
        changed
    }

    /// Run `hook` synchronously on every token change.
    ///
    /// Hooks run while the token is write-locked: readers of the store block
    /// until every hook has returned. A hook must not call back into the store.
    pub fn on_transition(&self, hook: impl Fn(Option<&BearerToken>) + Send + Sync + 'static) {
        self.shared
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    /// Subscribe to token transitions.
    ///
    /// The returned receiver starts with the current value marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<BearerToken>> {
        self.shared.tx.subscribe()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(None)
    }
}
