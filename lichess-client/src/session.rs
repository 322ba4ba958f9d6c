//! Signing in and out with a stored access token.
//!
//! The OAuth flow that produces the token happens elsewhere. These helpers
//! take the resulting token, check it against `/api/account`, and keep it in a
//! [`TokenStore`] so later runs can [`resume`] without signing in again.

use lichess_auth::{AuthError, AuthToken, TokenStore};

use crate::client::Lichess;
use crate::config::ClientConfig;
use crate::error::LichessError;

/// A validated token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    /// The access token.
    pub token: AuthToken,
    /// Username of the token's owner.
    pub username: String,
}

impl Session {
    /// A client that authenticates as this session's user.
    #[must_use]
    pub fn client(&self, config: &ClientConfig) -> Lichess {
        Lichess::from_config(config.clone(), self.token.clone())
    }
}

/// Validate a freshly obtained token and persist it.
///
/// The token is only stored once `/api/account` accepts it.
pub async fn sign_in(
    store: &dyn TokenStore,
    token: AuthToken,
    config: &ClientConfig,
) -> Result<Session, LichessError> {
    if token.is_empty() {
        return Err(AuthError::Invalid("empty token".into()).into());
    }
    let account = Lichess::from_config(config.clone(), token.clone())
        .account()
        .await?;
    store.store(token.clone()).await?;
    tracing::debug!(username = %account.username, "signed in to Lichess");
    Ok(Session {
        token,
        username: account.username,
    })
}

/// Restore the session from a stored token, if it is still accepted.
///
/// Returns `Ok(None)` when nothing is stored, or when the stored token has
/// expired or been revoked; such a token is cleared from the store unless the
/// store is read-only.
pub async fn resume(
    store: &dyn TokenStore,
    config: &ClientConfig,
) -> Result<Option<Session>, LichessError> {
    let Some(token) = store.load().await? else {
        return Ok(None);
    };
    if token.is_expired() {
        tracing::debug!("stored Lichess token expired");
        forget(store).await?;
        return Ok(None);
    }

    match Lichess::from_config(config.clone(), token.clone())
        .account()
        .await
    {
        Ok(account) => Ok(Some(Session {
            token,
            username: account.username,
        })),
        Err(LichessError::Authentication(reason)) => {
            tracing::debug!(%reason, "stored Lichess token rejected");
            forget(store).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

async fn forget(store: &dyn TokenStore) -> Result<(), AuthError> {
    match store.clear().await {
        Err(AuthError::ReadOnly(source)) => {
            tracing::debug!(%source, "token store is read-only, leaving token in place");
            Ok(())
        }
        other => other,
    }
}

/// Forget the stored token.
pub async fn sign_out(store: &dyn TokenStore) -> Result<(), LichessError> {
    store.clear().await?;
    tracing::debug!("signed out of Lichess");
    Ok(())
}
