//! Read-only token store over an environment variable.

use async_trait::async_trait;

use crate::{AuthError, AuthToken, TokenStore};

/// Environment variable read by [`EnvTokenStore::new`].
pub const DEFAULT_TOKEN_VAR: &str = "LICHESS_TOKEN";

/// Reads a personal API token from an environment variable.
///
/// Writes are rejected with [`AuthError::ReadOnly`]; the process environment
/// is not a place to persist credentials.
#[derive(Debug, Clone)]
pub struct EnvTokenStore {
    var_name: String,
}

impl EnvTokenStore {
    /// Read from `LICHESS_TOKEN`.
    pub fn new() -> Self {
        Self::with_var(DEFAULT_TOKEN_VAR)
    }

    /// Read from a custom variable.
    pub fn with_var(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }

    /// The variable this store reads.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl Default for EnvTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for EnvTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, AuthError> {
        match std::env::var(&self.var_name) {
            Ok(val) if val.trim().is_empty() => Ok(None),
            Ok(val) => Ok(Some(AuthToken::new(val.trim()))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(AuthError::Invalid(format!(
                "env var {} is not valid unicode",
                self.var_name
            ))),
        }
    }

    async fn store(&self, _token: AuthToken) -> Result<(), AuthError> {
        Err(AuthError::ReadOnly(self.var_name.clone()))
    }

    async fn clear(&self) -> Result<(), AuthError> {
        Err(AuthError::ReadOnly(self.var_name.clone()))
    }
}
