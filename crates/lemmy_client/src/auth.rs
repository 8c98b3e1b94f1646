//! Token holder owned by a [`Requestor`](crate::Requestor).
//!
//! Set by login, cleared by logout. Nothing is written to disk.

use std::fmt;

/// Bearer token for the instance API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    token: Option<String>,
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Authentication {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the token. No validation is done.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    /// True when a non-empty token is held. An empty string is stored as-is
    /// but never injected into requests.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
