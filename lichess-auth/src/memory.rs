//! In-process token store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AuthError, AuthToken, TokenStore};

/// Keeps the token in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<AuthToken>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, AuthError> {
        Ok(self.token.read().await.clone())
    }

    async fn store(&self, token: AuthToken) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::Invalid("empty token".into()));
        }
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.token.write().await.take();
        Ok(())
    }
}
