#![deny(missing_docs)]
//! Bearer token storage for the Lichess API.
//!
//! Lichess authenticates every API call with `Authorization: Bearer <token>`.
//! The token comes either from an OAuth2 authorization-code + PKCE flow (run
//! by an external library, configured with [`OAuthConfig`]) or from a personal
//! API token. This crate keeps that token:
//!
//! - [`AuthToken`] holds the secret, zeroed on drop and redacted in `Debug`.
//! - [`TokenStore`] is the persistence seam, with [`MemoryTokenStore`],
//!   [`FileTokenStore`], and the read-only [`EnvTokenStore`].

mod env;
mod file;
mod memory;
mod oauth;

pub use env::{DEFAULT_TOKEN_VAR, EnvTokenStore};
pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
pub use oauth::{DEFAULT_CLIENT_ID, DEFAULT_SCOPES, LICHESS_HOST, OAuthConfig};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors from token storage.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is unusable (empty, malformed, expired).
    #[error("invalid token: {0}")]
    Invalid(String),

    /// The store does not support writes.
    #[error("read-only token store: {0}")]
    ReadOnly(String),

    /// Storage backend failure (I/O, permissions, etc.).
    #[error("backend error: {0}")]
    BackendError(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An opaque bearer token with optional expiry.
///
/// Clones share one allocation, which is zeroed when the last clone drops.
/// The only way to read the value is [`AuthToken::with_secret`].
#[derive(Clone)]
pub struct AuthToken {
    inner: Arc<Zeroizing<String>>,
    expires_at: Option<SystemTime>,
}

impl AuthToken {
    /// Create a token that does not expire (personal API tokens).
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Zeroizing::new(token.into())),
            expires_at: None,
        }
    }

    /// Create a token that expires at the given time.
    pub fn expiring(token: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..Self::new(token)
        }
    }

    /// Scoped exposure of the token text.
    pub fn with_secret<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }

    /// Whether the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Check if this token has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| SystemTime::now() > exp)
            .unwrap_or(false)
    }

    /// Returns when this token expires, if known.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Load, persist, and forget the current access token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, or `None` if nothing is stored.
    async fn load(&self) -> Result<Option<AuthToken>, AuthError>;

    /// Replace the stored token.
    async fn store(&self, token: AuthToken) -> Result<(), AuthError>;

    /// Forget the stored token. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), AuthError>;
}

#[async_trait]
impl<S: TokenStore + ?Sized> TokenStore for Arc<S> {
    async fn load(&self) -> Result<Option<AuthToken>, AuthError> {
        (**self).load().await
    }

    async fn store(&self, token: AuthToken) -> Result<(), AuthError> {
        (**self).store(token).await
    }

    async fn clear(&self) -> Result<(), AuthError> {
        (**self).clear().await
    }
}
