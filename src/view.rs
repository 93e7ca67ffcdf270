// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conditional render primitives.
//!
//! Framework-agnostic: a "view" is whatever the render closure returns.
//!
//! ```rust,ignore
//! let header = auth_switch(&session, || "Sign out", || "Sign in");
//! let menu = signed_in(&session, || render_account_menu());
//! ```

use crate::auth::{BearerToken, TokenStore};
use crate::session::Session;

/// Anything that knows whether the user is authenticated.
pub trait AuthStatus {
    fn is_authenticated(&self) -> bool;
}

impl<U> AuthStatus for Session<U>
where
    U: Clone + Send + Sync + 'static,
{
    fn is_authenticated(&self) -> bool {
        Session::is_authenticated(self)
    }
}

impl AuthStatus for TokenStore {
    fn is_authenticated(&self) -> bool {
        self.is_present()
    }
}

impl AuthStatus for Option<BearerToken> {
    fn is_authenticated(&self) -> bool {
        self.is_some()
    }
}

/// Render only when authenticated.
pub fn signed_in<A, V>(auth: &A, render: impl FnOnce() -> V) -> Option<V>
where
    A: AuthStatus + ?Sized,
{
    auth.is_authenticated().then(render)
}

/// Render only when not authenticated.
pub fn signed_out<A, V>(auth: &A, render: impl FnOnce() -> V) -> Option<V>
where
    A: AuthStatus + ?Sized,
{
    (!auth.is_authenticated()).then(render)
}

/// Render one of two views depending on authentication.
pub fn auth_switch<A, V>(
    auth: &A,
    signed_in: impl FnOnce() -> V,
    signed_out: impl FnOnce() -> V,
) -> V
where
    A: AuthStatus + ?Sized,
{
    if auth.is_authenticated() {
        signed_in()
    } else {
        signed_out()
    }
}
