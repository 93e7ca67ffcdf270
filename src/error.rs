// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::AuthError;

/// Error type accepted from caller-supplied refresh and fetch functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the session surface.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A handle was used after its session was torn down
    #[error("session handle used outside of an active session")]
    OutsideSession,

    #[error(transparent)]
    Auth(#[from] AuthError),
}
