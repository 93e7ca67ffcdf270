// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! bearer-session - Client-side bearer token session
//!
//! Holds a bearer token in memory, attaches it to outgoing `reqwest`
//! requests, refreshes it once when the server answers 401 and exposes
//! derived view state (authenticated?, current user, loading/error).
//!
//! ## Modules
//!
//! - `auth` - Token store, refresh collaborator, authenticated client
//! - `profile` - Current-user profile loader
//! - `session` - Session lifecycle and UI-facing surface
//! - `view` - Conditional render primitives
//! - `config` - Environment configuration
//! - `telemetry` - Logging setup

pub mod auth;
pub mod config;
pub mod error;
pub mod profile;
pub mod session;
pub mod telemetry;
pub mod view;

#[cfg(test)]
mod test_support;

pub use auth::{
    AuthClient, AuthError, BearerToken, HttpTokenRefresher, TokenRefresher, TokenStore,
};
pub use config::{ConfigError, SessionConfig};
pub use error::{BoxError, SessionError};
pub use profile::{HttpUserFetcher, UserFetcher, UserState, FETCH_USER_FAILED};
pub use session::{Session, SessionBuilder, SessionHandle};
pub use view::{auth_switch, signed_in, signed_out, AuthStatus};
