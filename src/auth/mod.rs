// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token handling for outgoing HTTP requests.
//!
//! ## Request Flow
//!
//! 1. The application sends a request through [`AuthClient`]
//! 2. The current token (if any) is attached as `Authorization: Bearer <token>`
//! 3. If the server answers 401:
//!    - the [`TokenRefresher`] is called once
//!    - the new token is stored in the [`TokenStore`]
//!    - the request is replayed with the new token
//! 4. A replayed request that still fails is returned to the caller as-is
//!
//! ## Security
//!
//! - Tokens live in memory only
//! - Token values are redacted from `Debug`/`Display` and never logged
//! - `Authorization` header values are marked sensitive

pub mod client;
pub mod error;
pub mod refresh;
pub mod store;
pub mod token;

pub use client::AuthClient;
pub use error::AuthError;
pub use refresh::{BoxFuture, HttpTokenRefresher, TokenRefresher};
pub use store::TokenStore;
pub use token::BearerToken;
